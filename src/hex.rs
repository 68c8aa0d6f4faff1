//! Кубические координаты гексов
//!
//! Каждая ячейка адресуется тройкой (q, r, s) с инвариантом q + r + s = 0.
//! Расстояние между гексами равно максимуму модулей разностей по осям.

use serde::Serialize;
use std::fmt;
use std::ops::{Add, Sub};

/// Вектор в кубическом пространстве (используется для ветра и смещений)
pub type Vec3 = [f32; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HexCoordinates {
    q: i32,
    r: i32,
    s: i32,
}

/// Шесть единичных направлений в фиксированном порядке
pub const DIRECTIONS: [HexCoordinates; 6] = [
    HexCoordinates::new(0, -1, 1),
    HexCoordinates::new(1, -1, 0),
    HexCoordinates::new(1, 0, -1),
    HexCoordinates::new(0, 1, -1),
    HexCoordinates::new(-1, 1, 0),
    HexCoordinates::new(-1, 0, 1),
];

impl HexCoordinates {
    #[must_use]
    pub const fn new(q: i32, r: i32, s: i32) -> Self {
        assert!(q + r + s == 0, "сумма кубических координат должна быть равна 0");
        Self { q, r, s }
    }

    /// Осевые координаты: s выводится из q и r
    #[must_use]
    pub const fn axial(q: i32, r: i32) -> Self {
        Self { q, r, s: -q - r }
    }

    #[must_use]
    pub fn q(self) -> i32 {
        self.q
    }

    #[must_use]
    pub fn r(self) -> i32 {
        self.r
    }

    #[must_use]
    pub fn s(self) -> i32 {
        self.s
    }

    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let d = self - other;
        d.q.unsigned_abs().max(d.r.unsigned_abs()).max(d.s.unsigned_abs())
    }

    /// Все шесть соседних координат, включая те, что лежат за краем карты
    pub fn neighbors(self) -> impl Iterator<Item = Self> {
        DIRECTIONS.iter().map(move |&d| self + d)
    }

    #[must_use]
    pub fn to_vec3(self) -> Vec3 {
        [self.q as f32, self.r as f32, self.s as f32]
    }

    /// Округляет дробные кубические координаты до ближайшего гекса.
    ///
    /// Каждая ось округляется отдельно, затем ось с наибольшей ошибкой
    /// пересчитывается из двух других, чтобы восстановить q + r + s = 0.
    #[must_use]
    pub fn round(q: f32, r: f32, s: f32) -> Self {
        let mut iq = q.round() as i32;
        let mut ir = r.round() as i32;
        let mut is = s.round() as i32;

        let q_diff = (iq as f32 - q).abs();
        let r_diff = (ir as f32 - r).abs();
        let s_diff = (is as f32 - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            iq = -ir - is;
        } else if r_diff > s_diff {
            ir = -iq - is;
        } else {
            is = -iq - ir;
        }

        Self::new(iq, ir, is)
    }

    /// То же, что [`HexCoordinates::round`], для дробных осевых координат
    #[must_use]
    pub fn round_axial(q: f32, r: f32) -> Self {
        Self::round(q, r, -q - r)
    }

    /// Соседняя координата в направлении с наибольшим скалярным произведением на вектор.
    ///
    /// Если ни одно направление не даёт положительного произведения, берётся первое.
    #[must_use]
    pub fn in_direction(self, vector: Vec3) -> Self {
        let mut best_dot = 0.0;
        let mut best = DIRECTIONS[0];

        for direction in DIRECTIONS {
            let d = dot(direction.to_vec3(), vector);
            if d > best_dot {
                best_dot = d;
                best = direction;
            }
        }

        self + best
    }

    /// Все координаты на расстоянии не больше `radius` (включая центр)
    #[must_use]
    pub fn within(self, radius: u32) -> Vec<Self> {
        let n = radius as i32;
        let mut result = Vec::with_capacity((3 * n * (n + 1) + 1) as usize);
        for dq in -n..=n {
            for dr in (-n).max(-dq - n)..=n.min(-dq + n) {
                result.push(self + Self::axial(dq, dr));
            }
        }
        result
    }
}

impl Add for HexCoordinates {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.q + other.q, self.r + other.r, self.s + other.s)
    }
}

impl Sub for HexCoordinates {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.q - other.q, self.r - other.r, self.s - other.s)
    }
}

impl fmt::Display for HexCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.q, self.r, self.s)
    }
}

/// Переводит угол в градусах в нормализованный вектор кубического пространства (для ветра)
#[must_use]
pub fn direction_from_degrees(degrees: f32) -> Vec3 {
    let radians = degrees.to_radians();
    let vx = radians.cos();
    let vy = radians.sin();

    let q = vx;
    let r = (3.0_f32.sqrt() / 2.0) * vy - 0.5 * vx;
    let s = -q - r;

    normalize([q, r, s])
}

#[must_use]
pub fn dot(a: Vec3, b: Vec3) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[must_use]
pub fn normalize(v: Vec3) -> Vec3 {
    let len = dot(v, v).sqrt();
    if len > f32::EPSILON {
        [v[0] / len, v[1] / len, v[2] / len]
    } else {
        [0.0; 3]
    }
}
