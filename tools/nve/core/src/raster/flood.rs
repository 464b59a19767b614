/// Which pixels a flood may spread into.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FloodRule {
    /// Anything except the boundary colour.
    UntilColour(u8),
    /// Only pixels matching the seed's colour.
    SeedColour,
}

/// Inclusive rectangle the flood may not leave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FloodBounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl FloodBounds {
    #[inline(always)]
    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < self.min_x || x > self.max_x || y < self.min_y || y > self.max_y {
            return None;
        }
        let width = (self.max_x - self.min_x + 1) as usize;
        Some((y - self.min_y) as usize * width + (x - self.min_x) as usize)
    }

    fn area(&self) -> usize {
        ((self.max_x - self.min_x + 1).max(0) * (self.max_y - self.min_y + 1).max(0)) as usize
    }
}

/// 4-connected flood from `seed` over the colours reported by `colour_at`.
/// Uses an explicit stack and returns every accepted pixel.
pub fn flood(
    seed: (i32, i32),
    bounds: FloodBounds,
    rule: FloodRule,
    colour_at: impl Fn(i32, i32) -> u8,
) -> Vec<(i32, i32)> {
    let mut accepted = Vec::new();
    if bounds.index(seed.0, seed.1).is_none() {
        return accepted;
    }
    let seed_colour = colour_at(seed.0, seed.1);
    let fillable = |c: u8| match rule {
        FloodRule::UntilColour(boundary) => c != boundary,
        FloodRule::SeedColour => c == seed_colour,
    };

    let mut visited = vec![false; bounds.area()];
    let mut stack = vec![seed];
    while let Some((x, y)) = stack.pop() {
        let Some(i) = bounds.index(x, y) else { continue };
        if visited[i] {
            continue;
        }
        visited[i] = true;
        if !fillable(colour_at(x, y)) {
            continue;
        }
        accepted.push((x, y));
        stack.extend([(x + 1, y), (x - 1, y), (x, y + 1), (x, y - 1)]);
    }
    accepted
}
