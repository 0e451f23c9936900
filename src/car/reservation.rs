//! Reservation chains and their extension along a car's route.

use crate::router::route;
use crate::util::Interval;
use crate::{CarId, Direction, Network, RouteProblem, SegmentId};
use smallvec::SmallVec;

/// A car's claim on part of a segment.
///
/// `begin` and `end` are distances from where cars enter the segment.
/// `from` is the direction the car enters the segment in and `direction`
/// the one it leaves in; they only differ when turning in a crossing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reservation {
    pub segment: SegmentId,
    pub begin: i32,
    pub end: i32,
    pub from: Direction,
    pub direction: Direction,
}

/// Segments to append to a chain, ending with a lane segment.
pub(crate) type Hops = SmallVec<[SegmentId; 8]>;

/// A chain which could not be extended as far as required.
#[derive(Clone, Debug)]
pub(crate) struct Stalled {
    /// The chain, extended as far as it could be.
    pub chain: Vec<Reservation>,
    pub problem: RouteProblem,
}

impl Reservation {
    pub fn new(segment: SegmentId, begin: i32, end: i32, from: Direction, direction: Direction) -> Self {
        Self {
            segment,
            begin,
            end,
            from,
            direction,
        }
    }

    /// The length of the reserved stretch.
    pub fn length(&self) -> i32 {
        self.end - self.begin
    }

    pub fn interval(&self) -> Interval<i32> {
        Interval::new(self.begin, self.end)
    }

    /// Whether the car turns within the segment.
    pub fn is_turn(&self) -> bool {
        self.from != self.direction
    }

    /// The path taken through the segment.
    pub fn passage(&self) -> (Direction, Direction) {
        (self.from, self.direction)
    }
}

/// The total length of a chain.
pub(crate) fn reserved_length(chain: &[Reservation]) -> i32 {
    chain.iter().map(|res| res.length()).sum()
}

/// The prefix of a chain covering `size` units, which is the space a car physically takes up.
pub(crate) fn footprint(chain: &[Reservation], size: i32) -> SmallVec<[Reservation; 4]> {
    let mut left = size;
    let mut out = SmallVec::new();
    for res in chain {
        if left <= 0 {
            break;
        }
        let len = res.length().min(left);
        out.push(Reservation {
            end: res.begin + len,
            ..*res
        });
        left -= len;
    }
    out
}

/// The space a chain must reach into a lane segment, given the space
/// `before` it and the entries preceding it.
fn wanted(network: &Network, preceding: &[Reservation], before: i32, needed: i32, size: i32) -> i32 {
    let after_crossing = preceding
        .last()
        .map_or(false, |res| network.segment(res.segment).is_crossing());
    // A car stopping just beyond a crossing must have fully left it.
    let min = if after_crossing { size } else { 0 };
    (needed - before).max(min).max(0)
}

/// Reshapes a chain so that it covers `needed` units from its start.
///
/// Entries beyond the point where enough space is covered are dropped and the
/// last lane entry is shortened. When more space is needed, the chain grows
/// along its last segment and then along the segments returned by `next_hops`.
/// The chain never ends in a crossing unless it stalls.
pub(crate) fn project<F>(
    network: &Network,
    chain: &[Reservation],
    needed: i32,
    size: i32,
    mut next_hops: F,
) -> Result<Vec<Reservation>, Stalled>
where
    F: FnMut(&[Reservation]) -> Result<Hops, RouteProblem>,
{
    let mut out: Vec<Reservation> = Vec::with_capacity(chain.len() + 2);
    let mut total = 0;
    for res in chain {
        let mut res = *res;
        if network.segment(res.segment).is_lane() {
            let want = wanted(network, &out, total, needed, size);
            if want <= res.length() {
                res.end = res.begin + want;
                out.push(res);
                return Ok(out);
            }
        }
        total += res.length();
        out.push(res);
    }

    while let Some(tail) = out.last().copied() {
        let segment = network.segment(tail.segment);
        if segment.is_lane() {
            let before = total - tail.length();
            let want = wanted(network, &out[..out.len() - 1], before, needed, size);
            let end = (tail.begin + want).min(segment.length()).max(tail.end);
            total += end - tail.end;
            if let Some(last) = out.last_mut() {
                last.end = end;
            }
            if end - tail.begin >= want {
                return Ok(out);
            }
        }

        let hops = match next_hops(&out) {
            Ok(hops) if !hops.is_empty() => hops,
            Ok(_) => {
                let problem = RouteProblem::PathTooShort {
                    from: tail.segment,
                    to: tail.segment,
                };
                return Err(Stalled { chain: out, problem });
            }
            Err(problem) => return Err(Stalled { chain: out, problem }),
        };
        for next in hops {
            let Some(prev) = out.last_mut() else { break };
            let dir = network
                .direction_between(prev.segment, next)
                .unwrap_or(prev.direction);
            prev.direction = dir;
            let segment = network.segment(next);
            let (end, direction) = match segment.as_lane() {
                Some(lane) => (0, lane.direction()),
                None => (segment.length(), dir),
            };
            out.push(Reservation::new(next, 0, end, dir, direction));
            total += end;
        }
    }
    Ok(out)
}

/// Shrinks a chain to cover `needed` units without entering any new segment.
/// A chain already covering less is kept as it is.
pub(crate) fn shrink(network: &Network, chain: &[Reservation], needed: i32, size: i32) -> Vec<Reservation> {
    if needed >= reserved_length(chain) {
        return chain.to_vec();
    }
    project(network, chain, needed, size, |_| Ok(Hops::new())).unwrap_or_else(|stalled| stalled.chain)
}

/// The segments to append to a chain to move it toward the car's goals.
///
/// The route leads to the primary goal unless the chain already passes through
/// it, in which case it leads to the second goal. The route is cut after the
/// first lane segment.
pub(crate) fn next_hops(
    network: &Network,
    chain: &[Reservation],
    goals: [SegmentId; 2],
) -> Result<Hops, RouteProblem> {
    let [goal, second] = goals;
    let tail = match chain.last() {
        Some(res) => res.segment,
        None => return Ok(Hops::new()),
    };
    let mut target = if chain.iter().any(|res| res.segment == goal) {
        second
    } else {
        goal
    };
    if target == tail {
        target = if target == goal { second } else { goal };
    }

    let found = route(network, tail, target).ok_or(RouteProblem::NoPath {
        from: tail,
        to: target,
    })?;
    if found.segments.len() < 2 {
        return Err(RouteProblem::PathTooShort {
            from: tail,
            to: target,
        });
    }
    let mut hops = Hops::new();
    for id in found.segments.into_iter().skip(1) {
        hops.push(id);
        if network.segment(id).is_lane() {
            break;
        }
    }
    Ok(hops)
}

/// Replaces a registered chain with another, updating the occupants of the
/// segments which were left or entered.
pub(crate) fn replace_chain(
    network: &mut Network,
    car: CarId,
    chain: &mut Vec<Reservation>,
    new_chain: Vec<Reservation>,
) {
    let common = chain
        .iter()
        .zip(&new_chain)
        .take_while(|(a, b)| a.segment == b.segment)
        .count();
    for res in &chain[common..] {
        network.segment_mut(res.segment).release(car);
    }
    for res in &new_chain[common..] {
        network.segment_mut(res.segment).occupy(car);
    }
    *chain = new_chain;
}
