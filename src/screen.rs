//! Batch screening: compare every query molecule against clustered fragment hits, and
//! aggregate per query under a max or cumulative policy. Follow-up candidates that map
//! onto the binding space of the hits score high; ones that don't overlay are dropped.
//!
//! Per-record failures are warnings, not errors: a screening run over thousands of
//! molecules shouldn't die on one bad record.

use std::{
    io,
    path::{Path, PathBuf},
    time::Instant,
};

use crate::{
    file_io::{
        open_for_reading, open_for_writing,
        sdf::{SdfReader, write_record},
    },
    mol_features::{Feature, extract_features},
    molecule::Molecule,
    scoring::{ShapeMetric, SucosScores, sucos_score},
};

/// How per-hit scores aggregate into one result per query molecule.
#[derive(Clone, Copy, PartialEq, Debug, Default)]
pub enum ScoreMode {
    /// Report the single best-scoring hit, and which cluster it came from.
    #[default]
    Max,
    /// Report the sum of scores over all hits in all clusters.
    Cum,
}

/// One cluster SDF, loaded up front: every readable hit with its features precomputed.
pub struct ClusterHits {
    pub path: PathBuf,
    pub hits: Vec<(Molecule, Vec<Feature>)>,
}

impl ClusterHits {
    /// The file name alone; score annotations shouldn't leak local directory layout.
    fn display_name(&self) -> String {
        match self.path.file_name() {
            Some(f) => f.to_string_lossy().to_string(),
            None => self.path.display().to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ScreenSummary {
    pub written: usize,
    pub omitted: usize,
    pub comparisons: usize,
}

pub fn load_cluster(path: &Path) -> io::Result<ClusterHits> {
    let reader = open_for_reading(path)?;
    let mut hits = Vec::new();

    for (i, record) in SdfReader::new(reader).enumerate() {
        let num = i + 1;

        let mol = match record {
            Ok(m) => m,
            Err(e) => {
                eprintln!("WARNING: failed to read molecule {num} in cluster {path:?}: {e}");
                continue;
            }
        };

        match extract_features(&mol) {
            Ok(features) => hits.push((mol, features)),
            Err(e) => {
                eprintln!(
                    "WARNING: failed to generate features for molecule {num} in cluster {path:?}: {e}"
                );
            }
        }
    }

    Ok(ClusterHits {
        path: path.to_path_buf(),
        hits,
    })
}

/// Run the full screen: clusters into memory, queries streamed through, annotated
/// survivors written out. Queries with no overlap against any hit are omitted.
pub fn process(
    input: &Path,
    clusters: &[PathBuf],
    output: &Path,
    mode: ScoreMode,
    metric: ShapeMetric,
) -> io::Result<ScreenSummary> {
    let start = Instant::now();

    let mut all_clusters = Vec::with_capacity(clusters.len());
    for path in clusters {
        let cluster = load_cluster(path)?;
        println!("Loaded {} hits from cluster {path:?}", cluster.hits.len());
        all_clusters.push(cluster);
    }

    let reader = SdfReader::new(open_for_reading(input)?);
    let mut writer = open_for_writing(output)?;

    let mut summary = ScreenSummary::default();

    for (i, record) in reader.enumerate() {
        let mol_num = i + 1;

        let mut mol = match record {
            Ok(m) => m,
            Err(e) => {
                eprintln!("WARNING: failed to read molecule {mol_num} in input: {e}");
                continue;
            }
        };

        let query_features = match extract_features(&mol) {
            Ok(f) => f,
            Err(e) => {
                eprintln!(
                    "WARNING: failed to generate features for molecule {mol_num} in input: {e}"
                );
                continue;
            }
        };

        let mut totals = SucosScores::default();
        // (cluster index, 1-based hit index within its file)
        let mut best: Option<(usize, usize)> = None;

        for (c_i, cluster) in all_clusters.iter().enumerate() {
            for (h_i, (hit, hit_features)) in cluster.hits.iter().enumerate() {
                summary.comparisons += 1;
                let scores = sucos_score(hit, &mol, hit_features, &query_features, metric);

                match mode {
                    ScoreMode::Max => {
                        if scores.sucos > totals.sucos {
                            totals = scores;
                            best = Some((c_i, h_i + 1));
                        }
                    }
                    ScoreMode::Cum => {
                        totals.sucos += scores.sucos;
                        totals.feature_map += scores.feature_map;
                        totals.shape += scores.shape;
                    }
                }
            }
        }

        if totals.sucos > 0. {
            match mode {
                ScoreMode::Max => {
                    mol.set_prop("Max_SuCOS_Score", totals.sucos.to_string());
                    mol.set_prop("Max_SuCOS_FeatureMap_Score", totals.feature_map.to_string());
                    mol.set_prop("Max_SuCOS_Protrude_Score", totals.shape.to_string());

                    if let Some((c_i, hit_idx)) = best {
                        mol.set_prop("Max_SuCOS_Cluster", all_clusters[c_i].display_name());
                        mol.set_prop("Max_SuCOS_Index", hit_idx.to_string());
                    }
                }
                ScoreMode::Cum => {
                    mol.set_prop("Cum_SuCOS_Score", totals.sucos.to_string());
                    mol.set_prop("Cum_SuCOS_FeatureMap_Score", totals.feature_map.to_string());
                    mol.set_prop("Cum_SuCOS_Protrude_Score", totals.shape.to_string());
                }
            }

            write_record(writer.as_mut(), &mol)?;
            summary.written += 1;
        } else {
            eprintln!("Molecule {mol_num} did not overlay. Omitting from results");
            summary.omitted += 1;
        }
    }

    writer.flush()?;

    println!(
        "Completed {} comparisons in {} ms. Written: {} Omitted: {}",
        summary.comparisons,
        start.elapsed().as_millis(),
        summary.written,
        summary.omitted
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use lin_alg::f64::Vec3;

    use super::*;
    use crate::{
        element::Element,
        molecule::{Atom, Bond, BondType},
    };

    fn ethanol_at(x: f64) -> Molecule {
        let atoms = vec![
            (Element::Carbon, x),
            (Element::Carbon, x + 1.5),
            (Element::Oxygen, x + 2.9),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (element, ax))| Atom {
            serial_number: i as u32 + 1,
            posit: Vec3::new(ax, 0., 0.),
            element,
            formal_charge: 0,
        })
        .collect();

        let bonds = vec![
            Bond {
                bond_type: BondType::Single,
                atom_0: 0,
                atom_1: 1,
            },
            Bond {
                bond_type: BondType::Single,
                atom_0: 1,
                atom_1: 2,
            },
        ];

        Molecule::new("ethanol".to_string(), atoms, bonds, Vec::new())
    }

    fn write_sdf(path: &Path, mols: &[Molecule]) {
        let mut w = open_for_writing(path).unwrap();
        for mol in mols {
            write_record(w.as_mut(), mol).unwrap();
        }
        w.flush().unwrap();
    }

    fn read_sdf(path: &Path) -> Vec<Molecule> {
        SdfReader::new(open_for_reading(path).unwrap())
            .map(|r| r.unwrap())
            .collect()
    }

    fn prop<'a>(mol: &'a Molecule, key: &str) -> &'a str {
        &mol.metadata
            .iter()
            .find(|(k, _)| k == key)
            .unwrap_or_else(|| panic!("missing field {key}"))
            .1
    }

    #[test]
    fn max_mode_annotates_best_hit() {
        let dir = std::env::temp_dir().join("sucos_screen_max");
        fs::create_dir_all(&dir).unwrap();

        let cluster_a = dir.join("cluster_a.sdf");
        let cluster_b = dir.join("cluster_b.sdf");
        // Cluster B's hit sits on the query; cluster A's is offset.
        write_sdf(&cluster_a, &[ethanol_at(3.)]);
        write_sdf(&cluster_b, &[ethanol_at(50.), ethanol_at(0.)]);

        let input = dir.join("input.sdf");
        write_sdf(&input, &[ethanol_at(0.), ethanol_at(200.)]);

        let output = dir.join("output.sdf");
        let summary = process(
            &input,
            &[cluster_a, cluster_b],
            &output,
            ScoreMode::Max,
            ShapeMetric::Protrude,
        )
        .unwrap();

        // 2 queries x 3 hits.
        assert_eq!(summary.comparisons, 6);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.omitted, 1);

        let out = read_sdf(&output);
        assert_eq!(out.len(), 1);

        let score: f64 = prop(&out[0], "Max_SuCOS_Score").parse().unwrap();
        assert_eq!(score, 1.);
        assert_eq!(prop(&out[0], "Max_SuCOS_Cluster"), "cluster_b.sdf");
        assert_eq!(prop(&out[0], "Max_SuCOS_Index"), "2");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn cum_mode_sums_over_all_hits() {
        let dir = std::env::temp_dir().join("sucos_screen_cum");
        fs::create_dir_all(&dir).unwrap();

        let cluster_a = dir.join("a.sdf");
        let cluster_b = dir.join("b.sdf");
        write_sdf(&cluster_a, &[ethanol_at(0.)]);
        write_sdf(&cluster_b, &[ethanol_at(0.)]);

        let input = dir.join("input.sdf");
        write_sdf(&input, &[ethanol_at(0.)]);

        let output = dir.join("output.sdf");
        let summary = process(
            &input,
            &[cluster_a, cluster_b],
            &output,
            ScoreMode::Cum,
            ShapeMetric::Protrude,
        )
        .unwrap();

        assert_eq!(summary.comparisons, 2);

        let out = read_sdf(&output);
        let score: f64 = prop(&out[0], "Cum_SuCOS_Score").parse().unwrap();
        assert_eq!(score, 2.);

        // Max-specific fields don't appear in cum mode.
        assert!(
            !out[0]
                .metadata
                .iter()
                .any(|(k, _)| k == "Max_SuCOS_Cluster")
        );

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn gzip_end_to_end() {
        let dir = std::env::temp_dir().join("sucos_screen_gz");
        fs::create_dir_all(&dir).unwrap();

        let cluster = dir.join("cluster.sdf.gz");
        write_sdf(&cluster, &[ethanol_at(0.)]);

        let input = dir.join("input.sdf.gz");
        write_sdf(&input, &[ethanol_at(0.)]);

        let output = dir.join("output.sdf.gz");
        let summary = process(
            &input,
            &[cluster],
            &output,
            ScoreMode::Max,
            ShapeMetric::Protrude,
        )
        .unwrap();

        assert_eq!(summary.written, 1);

        let out = read_sdf(&output);
        assert_eq!(out.len(), 1);
        assert_eq!(prop(&out[0], "Max_SuCOS_Cluster"), "cluster.sdf.gz");

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unreadable_cluster_records_are_skipped() {
        let dir = std::env::temp_dir().join("sucos_screen_bad");
        fs::create_dir_all(&dir).unwrap();

        let cluster = dir.join("cluster.sdf");
        let mut text = String::new();
        {
            let mut buf = Vec::new();
            write_record(&mut buf, &ethanol_at(0.)).unwrap();
            text.push_str("garbage\n\n\n 99 99  0  0  0  0  0  0  0  0999 V2000\n$$$$\n");
            text.push_str(std::str::from_utf8(&buf).unwrap());
        }
        fs::write(&cluster, text).unwrap();

        let loaded = load_cluster(&cluster).unwrap();
        assert_eq!(loaded.hits.len(), 1);

        fs::remove_dir_all(&dir).ok();
    }
}
