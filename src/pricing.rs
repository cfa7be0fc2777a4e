use crate::dataset::DatasetRow;

/// Linear price update driven by the occupancy ratio.
/// A zero capacity leaves the price unchanged; the price is never clamped.
pub fn update(previous_price: f64, occupancy: f64, capacity: f64, sensitivity: f64) -> f64 {
    if capacity == 0. {
        return previous_price;
    }
    previous_price + sensitivity * (occupancy / capacity)
}

/// price after each row, applying `update` sequentially from `start`
pub fn price_path(start: f64, rows: &[DatasetRow], sensitivity: f64) -> Vec<f64> {
    let mut price = start;
    rows.iter()
        .map(|r| {
            price = update(price, r.occupancy, r.capacity, sensitivity);
            price
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BASE_PRICE;

    fn rows(pairs: &[(f64, f64)]) -> Vec<DatasetRow> {
        pairs
            .iter()
            .map(|&(occupancy, capacity)| DatasetRow {
                occupancy,
                capacity,
            })
            .collect()
    }

    #[test]
    fn zero_capacity_keeps_the_price() {
        for &(p, o, a) in &[(10., 5., 1.), (0., 0., 0.), (-3.5, 1e9, -2.), (1e12, 7., 0.3)] {
            assert_eq!(update(p, o, 0., a), p);
        }
    }

    #[test]
    fn positive_capacity_adds_the_scaled_ratio() {
        for &(p, o, c, a) in &[(10., 50., 100., 1.), (3.3, 7., 9., 0.25), (0., 120., 80., 2.)] {
            assert_eq!(update(p, o, c, a), p + a * (o / c));
        }
    }

    #[test]
    fn price_is_not_clamped() {
        let mut price = BASE_PRICE;
        for _ in 0..200 {
            price = update(price, 100., 100., 1.);
        }
        assert_eq!(price, 210.);
    }

    #[test]
    fn path_over_example_rows() {
        let path = price_path(BASE_PRICE, &rows(&[(50., 100.), (0., 100.), (100., 0.)]), 1.);
        assert_eq!(path, vec![10.5, 10.5, 10.5]);
    }

    #[test]
    fn path_is_reproducible() {
        let r = rows(&[(12., 40.), (33., 40.), (0., 0.), (40., 40.), (7., 13.)]);
        assert_eq!(price_path(BASE_PRICE, &r, 1.), price_path(BASE_PRICE, &r, 1.));
    }

    #[test]
    fn empty_path() {
        assert!(price_path(BASE_PRICE, &[], 1.).is_empty());
    }
}
