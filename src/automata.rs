use crate::config::CellularAutomataSettings;
use crate::grid::HexGrid;
use crate::noise::ScalarField;
use tracing::warn;

/// Сглаживает поле вокруг границы `boundary` клеточным автоматом.
///
/// Тайл, у которого больше `neighbors_for_transition` соседей по другую сторону
/// границы, принимает среднее значение этих соседей. Для краевых тайлов порог
/// уменьшается пропорционально числу соседей.
#[must_use]
pub fn cellular_automata_pass(
    grid: &HexGrid,
    field: &ScalarField,
    settings: &CellularAutomataSettings,
) -> ScalarField {
    assert_eq!(
        field.len(),
        grid.len(),
        "поле для автомата не совпадает с сеткой по размеру"
    );

    let zero_tiles = field.data.iter().filter(|v| v.abs() < f32::EPSILON).count();
    if zero_tiles as f32 > grid.len() as f32 * 0.1 {
        warn!(
            "{} тайлов с нулевым значением на входе автомата, поле может быть не инициализировано",
            zero_tiles
        );
    }

    let mut current = field.clone();
    for _ in 0..settings.passes {
        current = single_pass(
            grid,
            &current,
            settings.boundary,
            settings.neighbors_for_transition,
        );
    }
    current
}

fn single_pass(grid: &HexGrid, field: &ScalarField, boundary: f32, required: u32) -> ScalarField {
    let data: Vec<f32> = (0..grid.len())
        .map(|i| {
            let value = field.get(i);
            let above = value > boundary;
            let neighbors = grid.neighbors(i);

            let (count, sum) = neighbors
                .iter()
                .map(|&n| field.get(n))
                .filter(|&v| (v > boundary) != above)
                .fold((0u32, 0.0_f32), |(c, s), v| (c + 1, s + v));

            let threshold = if neighbors.len() == 6 {
                required
            } else {
                (required as f32 * neighbors.len() as f32 / 6.0).round() as u32
            };

            if count > threshold {
                sum / count as f32
            } else {
                value
            }
        })
        .collect();

    assert_eq!(
        data.len(),
        field.len(),
        "автомат вернул {} значений вместо {}",
        data.len(),
        field.len()
    );
    ScalarField { data }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hex::HexCoordinates;
    use proptest::prelude::*;

    #[test]
    fn isolated_peak_is_smoothed() {
        let grid = HexGrid::new(5, 5, 0.2);
        let center = grid.index_of(HexCoordinates::axial(0, 0)).unwrap();
        let mut field = ScalarField::from_vec(vec![0.1; grid.len()]);
        field.set(center, 0.9);

        let result = cellular_automata_pass(&grid, &field, &CellularAutomataSettings::new(0.5, 1));
        assert!((result.get(center) - 0.1).abs() < 1e-6);
        assert!(result.data.iter().all(|v| (v - 0.1).abs() < 1e-6));
    }

    #[test]
    fn few_opposite_neighbors_keep_value() {
        let grid = HexGrid::new(5, 5, 0.2);
        let center = grid.index_of(HexCoordinates::axial(0, 0)).unwrap();
        let mut field = ScalarField::from_vec(vec![0.1; grid.len()]);
        // Четыре соседа выше границы, а переход требует больше четырёх
        for &n in grid.neighbors(center).iter().take(4) {
            field.set(n, 0.8);
        }
        field.set(center, 0.2);

        let result = cellular_automata_pass(&grid, &field, &CellularAutomataSettings::new(0.5, 1));
        assert!((result.get(center) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn border_threshold_scales_with_neighbor_count() {
        let grid = HexGrid::new(6, 6, 0.2);
        let corner = grid.border_tiles()[0];
        assert!(grid.neighbors(corner).len() < 6);

        let mut field = ScalarField::from_vec(vec![0.1; grid.len()]);
        for &n in grid.neighbors(corner) {
            field.set(n, 0.9);
        }

        let result = cellular_automata_pass(&grid, &field, &CellularAutomataSettings::new(0.5, 1));
        assert!((result.get(corner) - 0.9).abs() < 1e-6);
    }

    #[test]
    fn zero_passes_is_identity() {
        let grid = HexGrid::new(4, 4, 0.2);
        let field = ScalarField::from_vec((0..grid.len()).map(|i| (i % 3) as f32 / 3.0).collect());
        let result = cellular_automata_pass(&grid, &field, &CellularAutomataSettings::new(0.5, 0));
        assert_eq!(result, field);
    }

    proptest! {
        #[test]
        fn preserves_keys_and_range(
            values in proptest::collection::vec(0.0f32..=1.0, 48),
            boundary in 0.0f32..1.0,
            passes in 1u32..4,
        ) {
            let grid = HexGrid::new(8, 6, 0.2);
            let field = ScalarField::from_vec(values);
            let result = cellular_automata_pass(&grid, &field, &CellularAutomataSettings::new(boundary, passes));
            prop_assert_eq!(result.len(), field.len());
            prop_assert!(result.data.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }
}
