use crate::errors::DataSourceError;
use crate::factor_steps::SECONDS_PER_HOUR;
use crate::NodeId;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// DWF per person: 120 l per inhabitant per day, i.e. 0.12 m3.
pub const DWF_PER_PERSON: f64 = 0.12;

#[derive(Clone, Debug, PartialEq)]
pub struct ImperviousSurface {
    pub id: i64,
    pub nr_of_inhabitants: Option<f64>,
}

/// One link from an impervious surface to the connection node it drains into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceMapEntry {
    pub impervious_surface_id: i64,
    pub connection_node_id: NodeId,
}

/// Constant DWF of a connection node in m3/s.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeBaseline {
    pub node_id: NodeId,
    pub baseline_flow: f64,
}

/// Where population and drainage data come from.
pub trait PopulationSource {
    fn impervious_surfaces(&mut self) -> Result<Vec<ImperviousSurface>, DataSourceError>;
    fn surface_map(&mut self) -> Result<Vec<SurfaceMapEntry>, DataSourceError>;
}

/// Sums inhabitants per connection node.
///
/// Each populated surface splits its inhabitants evenly over its map entries.
/// Surfaces without a positive number of inhabitants, or without map entries,
/// contribute nothing.
pub fn inhabitants_per_node(
    surfaces: &[ImperviousSurface],
    surface_map: &[SurfaceMapEntry],
) -> BTreeMap<NodeId, f64> {
    let mut map_counts: HashMap<i64, usize> = HashMap::new();
    for entry in surface_map {
        *map_counts.entry(entry.impervious_surface_id).or_insert(0) += 1;
    }
    let shares: HashMap<i64, f64> = surfaces
        .iter()
        .filter_map(|surface| {
            let inhabitants = match surface.nr_of_inhabitants {
                Some(n) if n > 0.0 => n,
                Some(n) if n < 0.0 => {
                    warn!("impervious surface {} has {} inhabitants, ignoring it", surface.id, n);
                    return None;
                }
                _ => return None,
            };
            let count = *map_counts.get(&surface.id)?;
            Some((surface.id, inhabitants / count as f64))
        })
        .collect();
    let mut per_node = BTreeMap::new();
    for entry in surface_map {
        if let Some(share) = shares.get(&entry.impervious_surface_id) {
            *per_node.entry(entry.connection_node_id).or_insert(0.0) += share;
        }
    }
    per_node.retain(|_, inhabitants| *inhabitants > 0.0);
    per_node
}

pub fn baselines_from_inhabitants(
    inhabitants: &BTreeMap<NodeId, f64>,
    dwf_per_person: f64,
) -> Vec<NodeBaseline> {
    inhabitants
        .iter()
        .map(|(node_id, inhabitants)| NodeBaseline {
            node_id: *node_id,
            baseline_flow: inhabitants * dwf_per_person / SECONDS_PER_HOUR as f64,
        })
        .collect()
}

/// Baseline DWF for every connection node with population, ordered by node id.
pub fn read_dwf_per_node<S: PopulationSource>(
    source: &mut S,
    dwf_per_person: f64,
) -> Result<Vec<NodeBaseline>, DataSourceError> {
    let surfaces = source.impervious_surfaces()?;
    let surface_map = source.surface_map()?;
    debug!(
        "{} impervious surfaces, {} map entries",
        surfaces.len(),
        surface_map.len()
    );
    let inhabitants = inhabitants_per_node(&surfaces, &surface_map);
    Ok(baselines_from_inhabitants(&inhabitants, dwf_per_person))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct MemorySource {
        surfaces: Vec<ImperviousSurface>,
        surface_map: Vec<SurfaceMapEntry>,
    }

    impl PopulationSource for MemorySource {
        fn impervious_surfaces(&mut self) -> Result<Vec<ImperviousSurface>, DataSourceError> {
            Ok(self.surfaces.clone())
        }
        fn surface_map(&mut self) -> Result<Vec<SurfaceMapEntry>, DataSourceError> {
            Ok(self.surface_map.clone())
        }
    }

    struct BrokenSource;

    impl PopulationSource for BrokenSource {
        fn impervious_surfaces(&mut self) -> Result<Vec<ImperviousSurface>, DataSourceError> {
            Err(DataSourceError::Query(diesel::result::Error::NotFound))
        }
        fn surface_map(&mut self) -> Result<Vec<SurfaceMapEntry>, DataSourceError> {
            Ok(Vec::new())
        }
    }

    fn surface(id: i64, nr_of_inhabitants: Option<f64>) -> ImperviousSurface {
        ImperviousSurface {
            id,
            nr_of_inhabitants,
        }
    }

    fn link(impervious_surface_id: i64, connection_node_id: NodeId) -> SurfaceMapEntry {
        SurfaceMapEntry {
            impervious_surface_id,
            connection_node_id,
        }
    }

    #[test]
    fn single_surface_on_single_node() {
        let mut source = MemorySource {
            surfaces: vec![surface(1, Some(100.0))],
            surface_map: vec![link(1, 7)],
        };
        let baselines =
            read_dwf_per_node(&mut source, DWF_PER_PERSON).expect("reading should succeed");
        assert_eq!(baselines.len(), 1);
        assert_eq!(baselines[0].node_id, 7);
        assert_relative_eq!(baselines[0].baseline_flow, 100.0 * 0.12 / 3600.0);
    }

    #[test]
    fn inhabitants_are_split_over_mapped_nodes() {
        let surfaces = vec![surface(1, Some(90.0)), surface(2, Some(10.0))];
        let surface_map = vec![link(1, 1), link(1, 2), link(1, 3), link(2, 3)];
        let inhabitants = inhabitants_per_node(&surfaces, &surface_map);
        let expected: BTreeMap<NodeId, f64> = [(1, 30.0), (2, 30.0), (3, 40.0)].into();
        assert_eq!(inhabitants, expected);
    }

    #[test]
    fn odd_splits_use_real_division() {
        let inhabitants = inhabitants_per_node(
            &[surface(1, Some(10.0))],
            &[link(1, 1), link(1, 2), link(1, 3)],
        );
        assert_eq!(inhabitants.len(), 3);
        for share in inhabitants.values() {
            assert_relative_eq!(*share, 10.0 / 3.0);
        }
    }

    #[test]
    fn unpopulated_nodes_are_absent() {
        let surfaces = vec![
            surface(1, None),
            surface(2, Some(0.0)),
            surface(3, Some(12.0)),
            surface(4, Some(50.0)),
        ];
        let surface_map = vec![link(1, 10), link(2, 20), link(3, 30)];
        let inhabitants = inhabitants_per_node(&surfaces, &surface_map);
        let expected: BTreeMap<NodeId, f64> = [(30, 12.0)].into();
        assert_eq!(inhabitants, expected);
    }

    #[test]
    fn negative_inhabitants_are_ignored() {
        let mut source = MemorySource {
            surfaces: vec![surface(1, Some(-50.0)), surface(2, Some(20.0))],
            surface_map: vec![link(1, 3), link(2, 3), link(1, 4)],
        };
        let baselines =
            read_dwf_per_node(&mut source, DWF_PER_PERSON).expect("reading should succeed");
        assert_eq!(baselines.len(), 1);
        assert_eq!(baselines[0].node_id, 3);
        assert_relative_eq!(baselines[0].baseline_flow, 20.0 * 0.12 / 3600.0);
    }

    #[test]
    fn population_is_conserved() {
        let surfaces: Vec<ImperviousSurface> = (1..=20)
            .map(|id| surface(id, Some(id as f64 * 7.5)))
            .collect();
        let surface_map: Vec<SurfaceMapEntry> = (1..=20)
            .flat_map(|id| (0..(id % 4 + 1)).map(move |k| link(id, (id * 3 + k) % 11)))
            .collect();
        let mut source = MemorySource {
            surfaces: surfaces.clone(),
            surface_map,
        };
        let baselines =
            read_dwf_per_node(&mut source, DWF_PER_PERSON).expect("reading should succeed");
        let total_flow: f64 = baselines.iter().map(|b| b.baseline_flow).sum();
        let total_inhabitants: f64 = surfaces.iter().filter_map(|s| s.nr_of_inhabitants).sum();
        assert_relative_eq!(
            total_flow * 3600.0 / DWF_PER_PERSON,
            total_inhabitants,
            max_relative = 1e-12
        );
        for pair in baselines.windows(2) {
            assert!(pair[0].node_id < pair[1].node_id);
        }
        assert!(baselines.iter().all(|b| b.baseline_flow > 0.0));
    }

    #[test]
    fn per_person_volume_scales_flow() {
        let inhabitants: BTreeMap<NodeId, f64> = [(1, 100.0)].into();
        let baselines = baselines_from_inhabitants(&inhabitants, 0.24);
        assert_relative_eq!(baselines[0].baseline_flow, 100.0 * 0.24 / 3600.0);
    }

    #[test]
    fn source_errors_propagate() {
        match read_dwf_per_node(&mut BrokenSource, DWF_PER_PERSON) {
            Err(DataSourceError::Query(..)) => (),
            _ => panic!("query error should propagate"),
        }
    }
}
