//! Ошибки генератора
//!
//! Сюда попадают только восстановимые ситуации: ошибки конфигурации, чтения файлов
//! и промахи поиска там, где тайл обязан существовать. Нарушения инвариантов
//! (NaN в атрибутах, несовпадение размеров полей, q + r + s ≠ 0) считаются дефектами
//! программы, они проверяются через `assert!`.

use crate::hex::HexCoordinates;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    /// Тайл с такими координатами должен существовать, но его нет в сетке
    #[error("тайл {0} не найден в сетке")]
    TileNotFound(HexCoordinates),

    /// Ни один тип местности не подошёл тайлу
    #[error("ни один тип местности не подходит тайлу {0}")]
    NoMatchingTerrain(HexCoordinates),

    /// У типа местности нет ни одного правила
    #[error("тип местности `{0}` не содержит правил")]
    EmptyRuleList(String),

    /// Два типа местности с одинаковым идентификатором
    #[error("тип местности `{0}` объявлен дважды")]
    DuplicateTerrain(String),

    /// Тип местности, на который ссылается тайл, отсутствует в реестре
    #[error("тип местности `{0}` отсутствует в реестре")]
    UnknownTerrain(String),

    /// Тайлу ещё не назначен тип местности
    #[error("тайлу {0} не назначен тип местности")]
    UnclassifiedTile(HexCoordinates),

    /// Значение параметра, с которым генерация невозможна
    #[error("некорректная конфигурация: {0}")]
    InvalidConfig(String),

    #[error("ошибка чтения: {0}")]
    Io(#[from] std::io::Error),

    #[error("некорректный TOML: {0}")]
    Toml(#[from] toml::de::Error),
}
