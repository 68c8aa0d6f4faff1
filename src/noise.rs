use crate::config::NoiseSettings;
use crate::grid::HexGrid;
use fastnoise_lite::{FastNoiseLite, NoiseType};
use rand::Rng;

/// Скалярное поле по тайлам сетки: значения от 0.0 до 1.0 по индексу тайла
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarField {
    pub data: Vec<f32>,
}

impl ScalarField {
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    #[must_use]
    pub fn from_vec(data: Vec<f32>) -> Self {
        Self { data }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> f32 {
        self.data[index]
    }

    pub fn set(&mut self, index: usize, value: f32) {
        self.data[index] = value;
    }

    #[must_use]
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f32>() / self.data.len() as f32
    }
}

/// Многооктавный шум по тайлам сетки.
///
/// Октава `i` имеет амплитуду `1 / 3^i` и частоту `3^i`. Общий случайный сдвиг
/// делает поле связным, сдвиг каждой октавы разносит октавы между собой.
/// Сумма делится на `Σамплитуд × fudge_factor` и возводится в `exponent`.
pub fn generate_noise_map<R: Rng>(
    grid: &HexGrid,
    settings: &NoiseSettings,
    rng: &mut R,
) -> ScalarField {
    let amplitudes: Vec<f32> = (0..settings.amplitude_count.max(1))
        .map(|i| 1.0 / 3.0_f32.powi(i as i32))
        .collect();
    let amplitude_sum: f32 = amplitudes.iter().sum();

    let width = grid.width as f32;
    let height = grid.height as f32;
    // Смещение держит координаты положительными, чтобы шум не отражался через ноль
    let coordinate_offset = ((width * width + height * height).sqrt() / 2.0).ceil();

    let mut noise = FastNoiseLite::new();
    noise.set_seed(Some(rng.gen_range(i32::MIN..=i32::MAX)));
    noise.set_noise_type(Some(NoiseType::Perlin));
    noise.set_frequency(Some(1.0));

    let shared_q = rng.gen_range(0.0..100.0_f32);
    let shared_r = rng.gen_range(0.0..100.0_f32);
    let octave_offsets: Vec<(f32, f32)> = amplitudes
        .iter()
        .map(|&a| {
            (
                rng.gen_range(0.0..0.3 / a) + shared_q,
                rng.gen_range(0.0..0.3 / a) + shared_r,
            )
        })
        .collect();

    let (sin, cos) = settings.rotation.unwrap_or(0.0).to_radians().sin_cos();

    let data = grid
        .tiles()
        .iter()
        .map(|tile| {
            let c = tile.coordinates();
            let qn = (c.q() as f32 + coordinate_offset) / width * settings.scale;
            let rn = (c.r() as f32 + coordinate_offset) / height * settings.scale;
            let (x, y) = (qn * cos - rn * sin, qn * sin + rn * cos);

            let sample: f32 = amplitudes
                .iter()
                .zip(&octave_offsets)
                .map(|(&amplitude, &(offset_q, offset_r))| {
                    let sx = (x / amplitude + offset_q) * settings.x_scale;
                    let sy = (y / amplitude + offset_r) * settings.y_scale;
                    amplitude * (noise.get_noise_2d(sx, sy) + 1.0) * 0.5
                })
                .sum();

            let normalized = sample / (amplitude_sum * settings.fudge_factor);
            normalized.max(0.0).powf(settings.exponent).clamp(0.0, 1.0)
        })
        .collect();

    ScalarField { data }
}

/// Линейная интерполяция; `t` обрезается до [0, 1]
#[must_use]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    a + (b - a) * t
}

/// Обратная интерполяция: положение `value` между `a` и `b`, обрезанное до [0, 1]
#[must_use]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() < f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}
