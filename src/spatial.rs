//! C11's external-interface neighbour: the spatial reference data a run's locations are
//! embedded in (`district_lookup`, per-location beta/population rasters, and the travel/gravity
//! weights the movement step draws destinations from).
//!
//! Per §1, raster (ASC) loading itself is an external collaborator — only the interface the
//! core consumes is in scope. [`SpatialData`] is therefore a plain, in-memory data holder:
//! `from_asc_grid` parses the one raster shape (ESRI ASCII grid) the original project's loader
//! consumes, but there is no district-shapefile reprojection, coordinate system handling, or any
//! of the other GIS machinery a general raster library would carry.
use crate::HashMap;

/// A 0-based district id, as looked up from a location's position in the district raster.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DistrictId(pub u32);

/// A parsed ESRI ASCII grid (`.asc`): a header plus row-major `f64` cell values, `NODATA_value`
/// cells stored as `None`. Locations are assigned raster cell indices in row-major order,
/// skipping `NODATA_value` cells, matching the original loader's `AscFile` -> `location_db`
/// projection.
#[derive(Clone, Debug)]
pub struct AscGrid {
    pub number_columns: usize,
    pub number_rows: usize,
    pub cellsize: f64,
    pub nodata_value: f64,
    pub cells: Vec<Option<f64>>,
}

impl AscGrid {
    /// Parses the minimal ESRI ASCII grid header (`ncols`, `nrows`, `cellsize`, `NODATA_value`;
    /// `xllcorner`/`yllcorner` are accepted but not retained, since nothing in the core needs
    /// absolute coordinates) followed by `nrows` rows of `ncols` whitespace-separated values.
    pub fn parse(contents: &str) -> Result<Self, crate::SimError> {
        let mut lines = contents.lines();
        let mut number_columns = None;
        let mut number_rows = None;
        let mut cellsize = None;
        let mut nodata_value = -9999.0;
        let mut data_start = contents.len();
        let mut consumed = 0usize;

        for line in &mut lines {
            consumed += line.len() + 1;
            let mut parts = line.split_whitespace();
            let Some(key) = parts.next() else { continue };
            let key_lower = key.to_ascii_lowercase();
            match key_lower.as_str() {
                "ncols" => number_columns = parts.next().and_then(|v| v.parse().ok()),
                "nrows" => number_rows = parts.next().and_then(|v| v.parse().ok()),
                "cellsize" => cellsize = parts.next().and_then(|v| v.parse().ok()),
                "nodata_value" => {
                    nodata_value = parts.next().and_then(|v| v.parse().ok()).unwrap_or(nodata_value);
                }
                "xllcorner" | "yllcorner" => {}
                _ => {
                    data_start = consumed - line.len() - 1;
                    break;
                }
            }
        }

        let number_columns: usize = number_columns
            .ok_or_else(|| crate::SimError::Config("ASC grid missing ncols".into()))?;
        let number_rows: usize = number_rows
            .ok_or_else(|| crate::SimError::Config("ASC grid missing nrows".into()))?;
        let cellsize: f64 = cellsize.unwrap_or(1.0);

        let mut cells = Vec::with_capacity(number_columns * number_rows);
        for token in contents[data_start..].split_whitespace() {
            let value: f64 = token
                .parse()
                .map_err(|_| crate::SimError::Config(format!("ASC grid contains non-numeric cell '{token}'")))?;
            cells.push(if (value - nodata_value).abs() < f64::EPSILON { None } else { Some(value) });
        }
        if cells.len() != number_columns * number_rows {
            return Err(crate::SimError::Config(format!(
                "ASC grid declares {number_columns}x{number_rows} cells but contains {}",
                cells.len()
            )));
        }

        Ok(AscGrid {
            number_columns,
            number_rows,
            cellsize,
            nodata_value,
            cells,
        })
    }

    #[must_use]
    pub fn row_col_of(&self, cell_index: usize) -> (usize, usize) {
        (cell_index / self.number_columns, cell_index % self.number_columns)
    }
}

/// Reference spatial data a run's `number_of_locations` grid is embedded in. Every accessor
/// degrades gracefully to a sensible default (a single uniform district, no beta/population
/// weighting, equal travel weight to every other location) when the corresponding raster was
/// never loaded — locations are always usable even for a run with no `spatial_info` configured.
#[derive(Clone, Debug, Default)]
pub struct SpatialData {
    number_of_locations: usize,
    district_lookup: Vec<DistrictId>,
    population_raster: Option<Vec<f64>>,
    beta_raster: Option<Vec<f64>>,
    /// Row-major `number_of_locations x number_of_locations` travel weight matrix (higher is
    /// closer / more connected), used by the movement step's gravity-style destination draw.
    travel_raster: Option<Vec<f64>>,
}

impl SpatialData {
    /// A grid with `number_of_locations` locations, all in a single district, with no raster
    /// weighting loaded. The default a run gets when `spatial_info` names no raster files.
    #[must_use]
    pub fn uniform(number_of_locations: usize) -> Self {
        SpatialData {
            number_of_locations,
            district_lookup: vec![DistrictId(0); number_of_locations],
            population_raster: None,
            beta_raster: None,
            travel_raster: None,
        }
    }

    /// Builds spatial data from parsed ASC grids, matching the original loader's per-raster-type
    /// dispatch. `district_grid`'s non-`NODATA` cells become consecutively-numbered 0-based
    /// districts in the order they appear, following `SpatialData::populate_dependent_data`'s
    /// district lookup table construction.
    #[must_use]
    pub fn from_grids(
        number_of_locations: usize,
        district_grid: Option<&AscGrid>,
        population_grid: Option<&AscGrid>,
        beta_grid: Option<&AscGrid>,
        travel_grid: Option<&AscGrid>,
    ) -> Self {
        let district_lookup = district_grid.map_or_else(
            || vec![DistrictId(0); number_of_locations],
            |grid| {
                let mut id_of: HashMap<i64, DistrictId> = HashMap::default();
                grid.cells
                    .iter()
                    .filter_map(|cell| *cell)
                    .map(|raw| {
                        let key = raw.round() as i64;
                        let next_id = DistrictId(id_of.len() as u32);
                        *id_of.entry(key).or_insert(next_id)
                    })
                    .collect()
            },
        );
        let population_raster = population_grid.map(|grid| grid.cells.iter().map(|cell| cell.unwrap_or(0.0)).collect());
        let beta_raster = beta_grid.map(|grid| grid.cells.iter().map(|cell| cell.unwrap_or(0.0)).collect());
        let travel_raster = travel_grid.map(|grid| grid.cells.iter().map(|cell| cell.unwrap_or(0.0)).collect());

        SpatialData {
            number_of_locations,
            district_lookup,
            population_raster,
            beta_raster,
            travel_raster,
        }
    }

    #[must_use]
    pub fn number_of_locations(&self) -> usize {
        self.number_of_locations
    }

    /// The district a location belongs to. Out-of-range locations map to district 0 rather than
    /// panicking — the scheduler calling this is hotter-path than config validation should be.
    #[must_use]
    pub fn district_lookup(&self, location: u32) -> DistrictId {
        self.district_lookup.get(location as usize).copied().unwrap_or(DistrictId(0))
    }

    #[must_use]
    pub fn district_count(&self) -> usize {
        self.district_lookup.iter().map(|district| district.0).max().map_or(1, |max| max as usize + 1)
    }

    #[must_use]
    pub fn locations_in_district(&self, district: DistrictId) -> Vec<u32> {
        self.district_lookup
            .iter()
            .enumerate()
            .filter(|(_, &d)| d == district)
            .map(|(location, _)| location as u32)
            .collect()
    }

    #[must_use]
    pub fn population(&self, location: u32) -> Option<f64> {
        self.population_raster.as_ref().and_then(|raster| raster.get(location as usize).copied())
    }

    #[must_use]
    pub fn beta(&self, location: u32) -> Option<f64> {
        self.beta_raster.as_ref().and_then(|raster| raster.get(location as usize).copied())
    }

    pub fn set_beta_raster(&mut self, beta_raster: Vec<f64>) {
        self.beta_raster = Some(beta_raster);
    }

    /// Relative weight of `from -> to` used by the movement step's gravity kernel. Falls back to
    /// a uniform `1.0` to every other location (equivalent to a flat kernel) when no travel
    /// raster was loaded; self-weight is always `0.0` (a person does not "travel" to their
    /// current location).
    #[must_use]
    pub fn travel_weight(&self, from: u32, to: u32) -> f64 {
        if from == to {
            return 0.0;
        }
        match &self.travel_raster {
            Some(raster) => raster.get(from as usize * self.number_of_locations + to as usize).copied().unwrap_or(0.0),
            None => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_ASC: &str = "ncols 2\nnrows 2\ncellsize 5\nNODATA_value -9999\n1 2\n-9999 3\n";

    #[test]
    fn parses_header_and_cells() {
        let grid = AscGrid::parse(SAMPLE_ASC).unwrap();
        assert_eq!(grid.number_columns, 2);
        assert_eq!(grid.number_rows, 2);
        assert_eq!(grid.cells, vec![Some(1.0), Some(2.0), None, Some(3.0)]);
    }

    #[test]
    fn uniform_grid_has_one_district() {
        let spatial = SpatialData::uniform(4);
        assert_eq!(spatial.district_count(), 1);
        assert_eq!(spatial.district_lookup(2), DistrictId(0));
    }

    #[test]
    fn district_grid_builds_lookup_table() {
        let grid = AscGrid::parse(SAMPLE_ASC).unwrap();
        let spatial = SpatialData::from_grids(3, Some(&grid), None, None, None);
        assert_eq!(spatial.district_count(), 3);
    }

    #[test]
    fn travel_weight_defaults_to_uniform_and_self_is_zero() {
        let spatial = SpatialData::uniform(3);
        assert_eq!(spatial.travel_weight(0, 0), 0.0);
        assert_eq!(spatial.travel_weight(0, 1), 1.0);
    }
}
