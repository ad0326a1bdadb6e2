//! Cartesian geometry primitives: points, axes, volumes and field components.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

// ============================================================================
// Points
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(values: [f64; 3]) -> Self {
        Self::new(values[0], values[1], values[2])
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn in_direction(&self, d: Direction) -> f64 {
        match d {
            Direction::X => self.x,
            Direction::Y => self.y,
            Direction::Z => self.z,
        }
    }

    pub fn set_direction(&mut self, d: Direction, value: f64) {
        match d {
            Direction::X => self.x = value,
            Direction::Y => self.y = value,
            Direction::Z => self.z = value,
        }
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0 && self.z == 0.0
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: f64) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

// ============================================================================
// Axes and dimensionality
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    X,
    Y,
    Z,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::X, Direction::Y, Direction::Z];

    pub fn index(self) -> usize {
        match self {
            Direction::X => 0,
            Direction::Y => 1,
            Direction::Z => 2,
        }
    }

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 3]
    }

    /// The axis `(d + 1) mod 3`.
    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// The axis `(d + 2) mod 3`.
    pub fn after_next(self) -> Self {
        Self::from_index(self.index() + 2)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Direction::X => "x",
            Direction::Y => "y",
            Direction::Z => "z",
        };
        f.write_str(label)
    }
}

/// Dimensionality of the host simulation grid. One-dimensional grids run
/// along z; two-dimensional grids span x and y.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Dimensionality {
    D1,
    D2,
    D3,
}

impl Dimensionality {
    pub fn active_directions(self) -> &'static [Direction] {
        match self {
            Dimensionality::D1 => &[Direction::Z],
            Dimensionality::D2 => &[Direction::X, Direction::Y],
            Dimensionality::D3 => &Direction::ALL,
        }
    }

    /// Whether power can flow along `d`. Two-dimensional grids also accept z,
    /// for modes of a cross-section that propagate out of plane.
    pub fn accepts_propagation(self, d: Direction) -> bool {
        match self {
            Dimensionality::D1 => d == Direction::Z,
            Dimensionality::D2 | Dimensionality::D3 => true,
        }
    }
}

// ============================================================================
// Volumes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub dim: Dimensionality,
    pub min: Vec3,
    pub max: Vec3,
}

const CONTAINMENT_SLACK: f64 = 1e-9;

impl Volume {
    pub fn new(dim: Dimensionality, a: Vec3, b: Vec3) -> Self {
        let min = Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z));
        let max = Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z));
        Self { dim, min, max }
    }

    pub fn centered(dim: Dimensionality, center: Vec3, size: Vec3) -> Self {
        let half = size * 0.5;
        Self::new(dim, center - half, center + half)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self, d: Direction) -> f64 {
        self.max.in_direction(d) - self.min.in_direction(d)
    }

    pub fn min_in(&self, d: Direction) -> f64 {
        self.min.in_direction(d)
    }

    /// Containment over the active axes of the volume's dimensionality.
    pub fn contains(&self, other: &Volume) -> bool {
        self.dim.active_directions().iter().all(|&d| {
            let slack = CONTAINMENT_SLACK * (1.0 + self.extent(d).abs());
            other.min_in(d) >= self.min_in(d) - slack
                && other.max.in_direction(d) <= self.max.in_direction(d) + slack
        })
    }

    pub fn contains_point(&self, p: &Vec3) -> bool {
        self.dim.active_directions().iter().all(|&d| {
            let slack = CONTAINMENT_SLACK * (1.0 + self.extent(d).abs());
            let v = p.in_direction(d);
            v >= self.min_in(d) - slack && v <= self.max.in_direction(d) + slack
        })
    }
}

// ============================================================================
// Field components
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Ex,
    Ey,
    Ez,
    Hx,
    Hy,
    Hz,
    Dx,
    Dy,
    Dz,
    Bx,
    By,
    Bz,
}

impl Component {
    pub const ELECTRIC: [Component; 3] = [Component::Ex, Component::Ey, Component::Ez];
    pub const MAGNETIC: [Component; 3] = [Component::Hx, Component::Hy, Component::Hz];

    pub fn electric(d: Direction) -> Self {
        Self::ELECTRIC[d.index()]
    }

    pub fn magnetic(d: Direction) -> Self {
        Self::MAGNETIC[d.index()]
    }

    pub fn direction(self) -> Direction {
        use Component::*;
        match self {
            Ex | Hx | Dx | Bx => Direction::X,
            Ey | Hy | Dy | By => Direction::Y,
            Ez | Hz | Dz | Bz => Direction::Z,
        }
    }

    /// Maps D onto E and B onto H along the same axis.
    pub fn normalized(self) -> Self {
        use Component::*;
        match self {
            Dx | Dy | Dz => Self::electric(self.direction()),
            Bx | By | Bz => Self::magnetic(self.direction()),
            other => other,
        }
    }

    pub fn is_electric(self) -> bool {
        matches!(self.normalized(), Component::Ex | Component::Ey | Component::Ez)
    }

    pub fn is_magnetic(self) -> bool {
        !self.is_electric()
    }

    /// Components of the TM family (Ez, Hx, Hy) in a two-dimensional grid.
    pub fn is_tm_2d(self) -> bool {
        matches!(
            self.normalized(),
            Component::Ez | Component::Hx | Component::Hy
        )
    }

    pub fn name(self) -> &'static str {
        use Component::*;
        match self {
            Ex => "ex",
            Ey => "ey",
            Ez => "ez",
            Hx => "hx",
            Hy => "hy",
            Hz => "hz",
            Dx => "dx",
            Dy => "dy",
            Dz => "dz",
            Bx => "bx",
            By => "by",
            Bz => "bz",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selects which source components an eigenmode source drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentMask {
    #[default]
    All,
    Only(Component),
}

impl ComponentMask {
    pub fn admits(self, c: Component) -> bool {
        match self {
            ComponentMask::All => true,
            ComponentMask::Only(only) => only.normalized() == c.normalized(),
        }
    }
}

/// For a surface current along `axis` on a plane with normal `normal`,
/// returns the field axis it is built from and the sign of `(n × F)` along
/// `axis`. Axes parallel to the normal carry no surface current.
pub fn cross_partner(axis: Direction, normal: Direction) -> Option<(Direction, f64)> {
    if axis == normal.next() {
        Some((normal.after_next(), -1.0))
    } else if axis == normal.after_next() {
        Some((normal.next(), 1.0))
    } else {
        None
    }
}
