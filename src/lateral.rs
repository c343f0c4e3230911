use crate::factor_steps::FactorStep;
use crate::lateral_csv::encode_series;
use crate::population::NodeBaseline;
use crate::NodeId;
use serde::{Deserialize, Serialize};

pub const LATERAL_UNITS: &str = "m3/s";

/// DWF of one connection node at each factor step, in m3/s.
#[derive(Clone, Debug, PartialEq)]
pub struct NodeTimeSeries {
    pub node_id: NodeId,
    pub series: Vec<(u64, f64)>,
}

impl NodeTimeSeries {
    pub fn new(baseline: &NodeBaseline, steps: &[FactorStep]) -> Self {
        NodeTimeSeries {
            node_id: baseline.node_id,
            series: steps
                .iter()
                .map(|step| (step.offset, baseline.baseline_flow * step.factor))
                .collect(),
        }
    }
}

/// Applies the shared factor steps to every node baseline, keeping baseline order.
pub fn synthesize(baselines: &[NodeBaseline], steps: &[FactorStep]) -> Vec<NodeTimeSeries> {
    baselines
        .iter()
        .map(|baseline| NodeTimeSeries::new(baseline, steps))
        .collect()
}

/// 1D lateral as accepted by the simulation API client.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Lateral {
    pub offset: u64,
    pub interpolate: u8,
    pub values: String,
    pub units: String,
    pub connection_node: NodeId,
}

impl From<&NodeTimeSeries> for Lateral {
    fn from(series: &NodeTimeSeries) -> Self {
        Lateral {
            offset: 0,
            interpolate: 0,
            values: encode_series(series),
            units: LATERAL_UNITS.to_string(),
            connection_node: series.node_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::population::DWF_PER_PERSON;
    use approx::assert_relative_eq;

    fn baseline(node_id: NodeId, baseline_flow: f64) -> NodeBaseline {
        NodeBaseline {
            node_id,
            baseline_flow,
        }
    }

    #[test]
    fn hundred_inhabitants_at_three_percent() {
        let baselines = [baseline(1, 100.0 * DWF_PER_PERSON / 3600.0)];
        let steps = [FactorStep::new(0, 0.03), FactorStep::new(3600, 0.015)];
        let series = synthesize(&baselines, &steps);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].node_id, 1);
        assert_eq!(series[0].series.len(), 2);
        assert_eq!(series[0].series[0].0, 0);
        assert_relative_eq!(series[0].series[0].1, 0.0001, max_relative = 1e-12);
        assert_eq!(series[0].series[1].0, 3600);
        assert_relative_eq!(series[0].series[1].1, 0.00005, max_relative = 1e-12);
    }

    #[test]
    fn every_node_shares_the_step_offsets() {
        let baselines = [baseline(9, 2.0), baseline(3, 0.5), baseline(5, 1.0)];
        let steps = [
            FactorStep::new(0, 0.5),
            FactorStep::new(10, 0.25),
            FactorStep::new(20, 1.0),
        ];
        let series = synthesize(&baselines, &steps);
        let node_ids: Vec<NodeId> = series.iter().map(|s| s.node_id).collect();
        assert_eq!(node_ids, vec![9, 3, 5]);
        assert_eq!(series[0].series, vec![(0, 1.0), (10, 0.5), (20, 2.0)]);
        assert_eq!(series[1].series, vec![(0, 0.25), (10, 0.125), (20, 0.5)]);
    }

    #[test]
    fn no_baselines_no_series() {
        assert!(synthesize(&[], &[FactorStep::new(0, 0.03)]).is_empty());
    }

    #[test]
    fn lateral_document_from_series() {
        let series = NodeTimeSeries {
            node_id: 12,
            series: vec![(0, 0.5), (60, 0.25)],
        };
        let lateral = Lateral::from(&series);
        assert_eq!(lateral.offset, 0);
        assert_eq!(lateral.interpolate, 0);
        assert_eq!(lateral.values, "0,0.5\n60,0.25");
        assert_eq!(lateral.units, "m3/s");
        assert_eq!(lateral.connection_node, 12);
    }
}
