pub mod loader;
pub mod types;

pub use loader::{load_dataset, read_clones, read_named_matrix, NamedMatrix};
pub use types::*;


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::error::CongaError;

    #[test]
    fn test_chain_keys_include_nucseq_when_present() {
        let mut c = clone(0, "CASS", "CSAR", 1, 2);
        assert_eq!(c.alpha_key(), "TRAV1|TRAJ1|CASS");
        c.cdr3a_nucseq = Some("TGTGCC".to_string());
        assert_eq!(c.alpha_key(), "TRAV1|TRAJ1|CASS|TGTGCC");
        assert_eq!(c.beta_key(), "TRBV1|TRBJ1|CSAR");
    }

    #[test]
    fn test_embedding_rejects_ragged_and_nan_rows() {
        let ragged = Embedding::from_rows("gex", vec![vec![1.0, 2.0], vec![1.0]]);
        assert!(matches!(
            ragged,
            Err(CongaError::DimensionMismatch { row: 1, .. })
        ));

        let nan = Embedding::from_rows("gex", vec![vec![1.0], vec![f64::NAN]]);
        assert!(matches!(nan, Err(CongaError::NonFiniteValue { row: 1, .. })));
    }

    #[test]
    fn test_dataset_preconditions() {
        let empty = Dataset::new(
            Vec::new(),
            Embedding::from_rows("gex", Vec::new()).unwrap(),
            Embedding::from_rows("tcr", Vec::new()).unwrap(),
            None,
            None,
        );
        assert!(matches!(empty, Err(CongaError::EmptyPopulation)));

        let clones = vec![clone(0, "A", "B", 0, 0), clone(1, "C", "D", 0, 0)];
        let gex = Embedding::from_rows("gex", vec![vec![0.0], vec![1.0]]).unwrap();
        let tcr = Embedding::from_rows("tcr", vec![vec![0.0]]).unwrap();
        let mismatched = Dataset::new(clones, gex, tcr, None, None);
        assert!(matches!(
            mismatched,
            Err(CongaError::LengthMismatch {
                expected: 2,
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_without_gex_clusters() {
        let clones = vec![
            clone(0, "A0", "B0", 0, 0),
            clone(1, "A1", "B1", 1, 0),
            clone(2, "A2", "B2", 2, 0),
        ];
        let gex = Embedding::from_rows("gex", vec![vec![0.0], vec![1.0], vec![2.0]]).unwrap();
        let tcr = Embedding::from_rows("tcr", vec![vec![5.0], vec![6.0], vec![7.0]]).unwrap();
        let dataset = Dataset::new(clones, gex, tcr, None, None).unwrap();

        let (filtered, removed) = dataset.without_gex_clusters(&[1]).unwrap();
        assert_eq!(removed, 1);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.clones[1].clone_id, "clone2");
        assert_eq!(filtered.tcr.row(1), &[7.0]);
    }
}
