// src/config.rs
//! Конфигурация генерации мира
//!
//! Этот модуль определяет все параметры, управляющие процедурной генерацией гексагональной карты:
//! - Параметры шума (масштаб, экспонента, число октав, поворот)
//! - Высоты, горные хребты и форма береговой линии
//! - Осадки, температура
//! - Реки и озёра
//!
//! Все структуры поддерживают сериализацию в TOML/JSON для удобной настройки через конфигурационные файлы.

use crate::error::MapError;
use crate::terrain::TerrainType;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Параметры одного шумового поля
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NoiseSettings {
    /// Масштаб: чем больше, тем мельче детали
    pub scale: f32,

    /// Экспонента распределения:
    /// - `<1.0` → поднимает низкие значения (больше суши, плато),
    /// - `=1.0` → линейно,
    /// - `>1.0` → смещает значения к нулю (редкие резкие пики).
    pub exponent: f32,

    /// Число октав (каждая следующая в 3 раза слабее и в 3 раза чаще)
    pub amplitude_count: u32,

    /// Запас нормализации, чтобы сумма октав не выходила за 1.0
    pub fudge_factor: f32,

    /// Поворот координат выборки в градусах (для вытянутых хребтов)
    pub rotation: Option<f32>,

    /// Растяжение координат выборки по X
    pub x_scale: f32,

    /// Растяжение координат выборки по Y
    pub y_scale: f32,
}

impl NoiseSettings {
    #[must_use]
    pub fn new(scale: f32, exponent: f32, amplitude_count: u32) -> Self {
        Self {
            scale,
            exponent,
            amplitude_count,
            ..Self::default()
        }
    }

    /// Тот же шум, повёрнутый на `angle` градусов и растянутый по осям
    #[must_use]
    pub fn with_rotation(mut self, angle: f32, x_scale: f32, y_scale: f32) -> Self {
        self.rotation = Some(angle);
        self.x_scale = x_scale;
        self.y_scale = y_scale;
        self
    }
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            scale: 2.0,
            exponent: 2.0,
            amplitude_count: 4,
            fudge_factor: 1.2,
            rotation: None,
            x_scale: 1.0,
            y_scale: 1.0,
        }
    }
}

/// Параметры сглаживания клеточным автоматом
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CellularAutomataSettings {
    /// Граница, относительно которой тайл считается «выше» или «ниже»
    pub boundary: f32,

    /// Сколько соседей с другой стороны границы нужно для перехода (для тайла с 6 соседями)
    pub neighbors_for_transition: u32,

    /// Число проходов
    pub passes: u32,
}

impl CellularAutomataSettings {
    #[must_use]
    pub fn new(boundary: f32, passes: u32) -> Self {
        Self {
            boundary,
            passes,
            ..Self::default()
        }
    }
}

impl Default for CellularAutomataSettings {
    fn default() -> Self {
        Self {
            boundary: 0.5,
            neighbors_for_transition: 4,
            passes: 1,
        }
    }
}

/// Горные хребты поверх базового рельефа
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ElevationFeatureSettings {
    pub enabled: bool,

    /// Сколько слоёв хребтов накладывается друг на друга
    pub range_count: u32,

    /// Шум маски хребтов (можно повернуть и растянуть для вытянутых цепей)
    pub mountain_noise: NoiseSettings,

    /// Шум, которым смешиваются слои хребтов
    pub mix_noise: NoiseSettings,
}

impl Default for ElevationFeatureSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            range_count: 3,
            mountain_noise: NoiseSettings::new(7.0, 0.8, 4),
            mix_noise: NoiseSettings::new(4.0, 2.0, 4),
        }
    }
}

/// Настройки карты высот
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AltitudeSettings {
    /// Базовый шум; верхняя граница строится из него же с утроенным масштабом
    pub noise: NoiseSettings,

    pub elevation_features: ElevationFeatureSettings,

    /// Шум, конкурирующий с формированием береговой линии
    pub water_boundary_noise: NoiseSettings,

    /// Уровень, выше которого начинаются горы (для второго прохода автомата)
    pub mountain_level: f32,

    /// Проходы автомата на уровне гор
    pub mountain_passes: u32,

    /// Соседей для перехода в обоих проходах автомата
    pub neighbors_for_transition: u32,
}

impl Default for AltitudeSettings {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::new(7.0, 2.0, 4),
            elevation_features: ElevationFeatureSettings::default(),
            water_boundary_noise: NoiseSettings::new(8.0, 2.0, 4),
            mountain_level: 0.7,
            mountain_passes: 2,
            neighbors_for_transition: 4,
        }
    }
}

/// Настройки модели дождевой тени
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PrecipitationSettings {
    /// Фиксированное направление ветра в градусах; `None` — случайное
    pub wind_direction: Option<f32>,

    /// Начальная облачность над океаном
    pub ocean_cloud_cover: f32,

    /// Начальная облачность над пресной водой
    pub fresh_water_cloud_cover: f32,

    /// Начальная облачность над сушей
    pub land_cloud_cover: f32,
}

impl Default for PrecipitationSettings {
    fn default() -> Self {
        Self {
            wind_direction: None,
            ocean_cloud_cover: 1.0,
            fresh_water_cloud_cover: 0.5,
            land_cloud_cover: 0.1,
        }
    }
}

/// Настройки температуры
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemperatureSettings {
    pub noise: NoiseSettings,

    /// Уточнять ли шум широтой, близостью океана и высотой
    pub refine: bool,

    /// Множитель температуры на полюсах
    pub pole_multiplier: f32,

    /// Множитель температуры на экваторе
    pub equator_multiplier: f32,

    /// Поменять полюса и экватор местами
    pub warm_poles: bool,

    /// Радиус влияния океана как доля среднего размера карты
    pub ocean_influence_ratio: f32,
}

impl Default for TemperatureSettings {
    fn default() -> Self {
        Self {
            noise: NoiseSettings::new(2.0, 1.25, 4),
            refine: true,
            pole_multiplier: 0.65,
            equator_multiplier: 1.35,
            warm_poles: false,
            ocean_influence_ratio: 0.05,
        }
    }
}

/// Настройки рек
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiverSettings {
    pub enabled: bool,

    /// Минимальная высота истока
    pub min_altitude: f32,

    /// Минимальная температура истока (во льдах реки не начинаются)
    pub min_temperature: f32,

    /// Минимальные осадки в истоке
    pub min_precipitation: f32,

    /// Реки короче этого числа тайлов отбрасываются
    pub min_length: usize,

    /// Радиус поиска воды или другой реки, к которой тянется русло
    pub bias_range: u32,

    /// Насколько сильно направление на цель понижает «эффективную» высоту соседа
    pub bias_strength: f32,

    /// Амплитуда случайного дрожания эффективной высоты
    pub jitter: f32,

    /// Вероятность превратить тупиковый конец реки в озеро
    pub lake_chance: f64,
}

impl Default for RiverSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            min_altitude: 0.65,
            min_temperature: 0.1,
            min_precipitation: 0.1,
            min_length: 3,
            bias_range: 10,
            bias_strength: 0.15,
            jitter: 0.02,
            lake_chance: 0.5,
        }
    }
}

/// Настройки озёр на концах рек
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LakeSettings {
    /// Доля хвоста реки, среди соседей которого ищется затравка озера
    pub tail_fraction: f32,

    /// Прирост вероятности остановки роста с каждым новым тайлом
    pub stop_increment: f32,

    /// Бонус кандидату за каждого дополнительного соседа-озеро (делает озёра круглее)
    pub roundness_bias: f32,

    /// Диапазон множителя уровня воды для дна озера
    pub depth_factor: (f32, f32),
}

impl Default for LakeSettings {
    fn default() -> Self {
        Self {
            tail_fraction: 0.2,
            stop_increment: 0.025,
            roundness_bias: 0.02,
            depth_factor: (0.85, 0.95),
        }
    }
}

/// Основные параметры генерации мира
///
/// Полная конфигурация для генерации одной карты. Поддерживает загрузку из TOML-файлов.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldGenerationParams {
    /// Сид генератора случайных чисел; без него берётся случайный
    #[serde(default)]
    pub seed: Option<u64>,

    /// Ширина карты в гексах (по умолчанию 64)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Высота карты в гексах (по умолчанию 48)
    #[serde(default = "default_height")]
    pub height: u32,

    /// Уровень воды: всё, что не выше, — океан или пресная вода
    #[serde(default = "default_water_level")]
    pub water_level: f32,

    #[serde(default)]
    pub altitude: AltitudeSettings,

    #[serde(default)]
    pub precipitation: PrecipitationSettings,

    #[serde(default)]
    pub temperature: TemperatureSettings,

    #[serde(default)]
    pub rivers: RiverSettings,

    #[serde(default)]
    pub lakes: LakeSettings,

    /// Свои типы местности; без них используется встроенный набор
    #[serde(default)]
    pub terrains: Option<Vec<TerrainType>>,
}

impl WorldGenerationParams {
    /// Загружает параметры из TOML-файла
    ///
    /// # Пример
    /// ```toml
    /// # world.toml
    /// seed = 42
    /// width = 80
    /// height = 60
    ///
    /// [rivers]
    /// min_length = 5
    /// ```
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, MapError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, MapError> {
        let params: Self = toml::from_str(contents)?;
        params.validate()?;
        Ok(params)
    }

    /// Проверяет значения, с которыми проходы генерации не могут работать
    pub fn validate(&self) -> Result<(), MapError> {
        ensure(self.width > 0 && self.height > 0, || {
            format!("размеры карты должны быть положительными, получено {}×{}", self.width, self.height)
        })?;
        unit("water_level", self.water_level)?;

        let altitude = &self.altitude;
        check_noise("altitude.noise", &altitude.noise)?;
        check_noise("altitude.water_boundary_noise", &altitude.water_boundary_noise)?;
        check_noise("altitude.elevation_features.mountain_noise", &altitude.elevation_features.mountain_noise)?;
        check_noise("altitude.elevation_features.mix_noise", &altitude.elevation_features.mix_noise)?;
        unit("altitude.mountain_level", altitude.mountain_level)?;

        let precipitation = &self.precipitation;
        if let Some(degrees) = precipitation.wind_direction {
            finite("precipitation.wind_direction", degrees)?;
        }
        non_negative("precipitation.ocean_cloud_cover", precipitation.ocean_cloud_cover)?;
        non_negative("precipitation.fresh_water_cloud_cover", precipitation.fresh_water_cloud_cover)?;
        non_negative("precipitation.land_cloud_cover", precipitation.land_cloud_cover)?;

        let temperature = &self.temperature;
        check_noise("temperature.noise", &temperature.noise)?;
        non_negative("temperature.pole_multiplier", temperature.pole_multiplier)?;
        non_negative("temperature.equator_multiplier", temperature.equator_multiplier)?;
        non_negative("temperature.ocean_influence_ratio", temperature.ocean_influence_ratio)?;

        let rivers = &self.rivers;
        finite("rivers.min_altitude", rivers.min_altitude)?;
        finite("rivers.min_temperature", rivers.min_temperature)?;
        finite("rivers.min_precipitation", rivers.min_precipitation)?;
        finite("rivers.bias_strength", rivers.bias_strength)?;
        non_negative("rivers.jitter", rivers.jitter)?;
        ensure((0.0..=1.0).contains(&rivers.lake_chance), || {
            format!("rivers.lake_chance должна лежать в [0, 1], получено {}", rivers.lake_chance)
        })?;

        let lakes = &self.lakes;
        unit("lakes.tail_fraction", lakes.tail_fraction)?;
        non_negative("lakes.stop_increment", lakes.stop_increment)?;
        finite("lakes.roundness_bias", lakes.roundness_bias)?;
        let (low, high) = lakes.depth_factor;
        non_negative("lakes.depth_factor", low)?;
        non_negative("lakes.depth_factor", high)?;
        ensure(low <= high, || {
            format!("lakes.depth_factor: нижняя граница {low} больше верхней {high}")
        })
    }
}

fn ensure(condition: bool, message: impl FnOnce() -> String) -> Result<(), MapError> {
    if condition {
        Ok(())
    } else {
        Err(MapError::InvalidConfig(message()))
    }
}

fn finite(name: &str, value: f32) -> Result<(), MapError> {
    ensure(value.is_finite(), || format!("{name} должен быть конечным числом, получено {value}"))
}

fn non_negative(name: &str, value: f32) -> Result<(), MapError> {
    ensure(value.is_finite() && value >= 0.0, || {
        format!("{name} не может быть отрицательным, получено {value}")
    })
}

fn unit(name: &str, value: f32) -> Result<(), MapError> {
    ensure((0.0..=1.0).contains(&value), || {
        format!("{name} должен лежать в [0, 1], получено {value}")
    })
}

fn check_noise(name: &str, settings: &NoiseSettings) -> Result<(), MapError> {
    finite(&format!("{name}.scale"), settings.scale)?;
    non_negative(&format!("{name}.exponent"), settings.exponent)?;
    ensure(settings.fudge_factor.is_finite() && settings.fudge_factor > 0.0, || {
        format!("{name}.fudge_factor должен быть положительным, получено {}", settings.fudge_factor)
    })?;
    finite(&format!("{name}.x_scale"), settings.x_scale)?;
    finite(&format!("{name}.y_scale"), settings.y_scale)?;
    if let Some(angle) = settings.rotation {
        finite(&format!("{name}.rotation"), angle)?;
    }
    Ok(())
}

fn default_width() -> u32 {
    64
}
fn default_height() -> u32 {
    48
}
fn default_water_level() -> f32 {
    0.175
}

impl Default for WorldGenerationParams {
    fn default() -> Self {
        Self {
            seed: None,
            width: 64,
            height: 48,
            water_level: 0.175,
            altitude: AltitudeSettings::default(),
            precipitation: PrecipitationSettings::default(),
            temperature: TemperatureSettings::default(),
            rivers: RiverSettings::default(),
            lakes: LakeSettings::default(),
            terrains: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let params = WorldGenerationParams::from_toml_str("").unwrap();
        assert_eq!(params.seed, None);
        assert_eq!(params.width, 64);
        assert_eq!(params.height, 48);
        assert_eq!(params.rivers, RiverSettings::default());
        assert!(params.terrains.is_none());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let params = WorldGenerationParams::from_toml_str(
            r#"
            seed = 42
            width = 20

            [rivers]
            min_length = 5

            [altitude.noise]
            scale = 3.5
            "#,
        )
        .unwrap();

        assert_eq!(params.seed, Some(42));
        assert_eq!(params.width, 20);
        assert_eq!(params.height, 48);
        assert_eq!(params.rivers.min_length, 5);
        assert_eq!(params.rivers.bias_range, 10);
        assert_eq!(params.altitude.noise.scale, 3.5);
        assert_eq!(params.altitude.noise.amplitude_count, 4);
        assert_eq!(params.altitude.mountain_level, 0.7);
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = WorldGenerationParams::from_toml_str("width = \"wide\"").unwrap_err();
        assert!(matches!(err, MapError::Toml(_)));
    }

    fn rejected(toml: &str) -> String {
        match WorldGenerationParams::from_toml_str(toml) {
            Err(MapError::InvalidConfig(message)) => message,
            other => panic!("ожидалась ошибка конфигурации для `{toml}`, получено {other:?}"),
        }
    }

    #[test]
    fn defaults_are_valid() {
        WorldGenerationParams::default().validate().unwrap();
    }

    #[test]
    fn rejects_empty_map() {
        assert!(rejected("width = 0").contains("размеры"));
        assert!(rejected("height = 0").contains("размеры"));
    }

    #[test]
    fn rejects_negative_jitter() {
        assert!(rejected("[rivers]\njitter = -0.1").contains("rivers.jitter"));
    }

    #[test]
    fn rejects_reversed_depth_factor() {
        assert!(rejected("[lakes]\ndepth_factor = [0.95, 0.85]").contains("depth_factor"));
    }

    #[test]
    fn rejects_nan_and_out_of_range_chances() {
        assert!(rejected("[rivers]\nlake_chance = nan").contains("lake_chance"));
        assert!(rejected("[rivers]\nlake_chance = 1.5").contains("lake_chance"));
        assert!(rejected("water_level = nan").contains("water_level"));
    }

    #[test]
    fn rejects_broken_noise() {
        assert!(rejected("[altitude.noise]\nfudge_factor = 0.0").contains("altitude.noise.fudge_factor"));
        assert!(
            rejected("[temperature.noise]\nexponent = -1.0").contains("temperature.noise.exponent")
        );
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = WorldGenerationParams::from_toml_file("/nonexistent/world.toml").unwrap_err();
        assert!(matches!(err, MapError::Io(_)));
    }
}
