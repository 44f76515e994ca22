//! Pharmacophore feature extraction: the point features SuCOS compares between a reference
//! hit and a query molecule. Families follow the scorer's keep list: donors, acceptors,
//! ionizable groups, aromatic rings, and hydrophobes (individual and lumped).
//!
//! Perception works from the SDF connection table alone: rings from bounded cycle search,
//! aromaticity from bond types (with a Kekulé fallback), hydrogens from explicit atoms or
//! inferred from typical valence.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    fmt::Display,
    io,
    io::ErrorKind,
};

use lin_alg::f64::Vec3;

use crate::{
    element::Element::*,
    molecule::{BondType, Molecule},
};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum FeatureFamily {
    Donor,
    Acceptor,
    NegIonizable,
    PosIonizable,
    Aromatic,
    Hydrophobe,
    LumpedHydrophobe,
}

impl Display for FeatureFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Clone, Debug)]
pub struct Feature {
    pub family: FeatureFamily,
    pub posit: Vec3,
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

fn canonical_cycle(nodes: &[usize]) -> Vec<usize> {
    let n = nodes.len();

    let (min_i, _) = nodes.iter().enumerate().min_by_key(|(_, v)| **v).unwrap();

    let mut rot_fwd = Vec::with_capacity(n);
    for k in 0..n {
        rot_fwd.push(nodes[(min_i + k) % n]);
    }

    let mut rev = Vec::with_capacity(n);
    for k in 0..n {
        rev.push(nodes[(min_i + n - (k % n)) % n]);
    }

    if rev < rot_fwd { rev } else { rot_fwd }
}

/// All simple cycles of exactly `len` atoms, deduplicated by canonical rotation/reflection.
fn find_cycles_len(adj: &[Vec<usize>], len: usize) -> Vec<Vec<usize>> {
    let n = adj.len();
    let mut cycles_set: HashSet<Vec<usize>> = HashSet::new();
    let mut stack: Vec<usize> = Vec::with_capacity(len);
    let mut visited = vec![false; n];

    fn dfs(
        adj: &[Vec<usize>],
        s: usize,
        u: usize,
        len: usize,
        stack: &mut Vec<usize>,
        visited: &mut [bool],
        cycles_set: &mut HashSet<Vec<usize>>,
    ) {
        if stack.len() == len {
            if adj[u].iter().any(|&v| v == s) {
                cycles_set.insert(canonical_cycle(stack));
            }
            return;
        }

        for &v in &adj[u] {
            if v == s || visited[v] || v < s {
                continue;
            }

            visited[v] = true;
            stack.push(v);
            dfs(adj, s, v, len, stack, visited, cycles_set);
            stack.pop();
            visited[v] = false;
        }
    }

    for s in 0..n {
        visited[s] = true;
        stack.clear();
        stack.push(s);

        for &v in &adj[s] {
            if v < s {
                continue;
            }
            visited[v] = true;
            stack.push(v);
            dfs(adj, s, v, len, &mut stack, &mut visited, &mut cycles_set);
            stack.pop();
            visited[v] = false;
        }

        visited[s] = false;
    }

    cycles_set.into_iter().collect()
}

fn centroid(mol: &Molecule, indices: &[usize]) -> Vec3 {
    let mut sum = Vec3::new_zero();
    for &i in indices {
        sum = sum + mol.atoms[i].posit;
    }
    sum * (1. / indices.len() as f64)
}

/// Extract the SuCOS feature set for one molecule, in its given 3D pose.
pub fn extract_features(mol: &Molecule) -> io::Result<Vec<Feature>> {
    if mol.atoms.is_empty() {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "Molecule has no atoms",
        ));
    }

    let adj = &mol.adjacency_list;

    let mut bond_type_by_edge: HashMap<(usize, usize), BondType> =
        HashMap::with_capacity(mol.bonds.len());
    for b in &mol.bonds {
        bond_type_by_edge.insert(edge_key(b.atom_0, b.atom_1), b.bond_type);
    }

    let has_h = |i: usize| -> bool {
        adj[i].iter().any(|&n| mol.atoms[n].element == Hydrogen) || mol.implicit_hydrogens(i) > 0
    };

    let is_double_bond = |a: usize, b: usize| -> bool {
        bond_type_by_edge
            .get(&edge_key(a, b))
            .map(|bt| *bt == BondType::Double)
            .unwrap_or(false)
    };

    let is_single_bond = |a: usize, b: usize| -> bool {
        bond_type_by_edge
            .get(&edge_key(a, b))
            .map(|bt| *bt == BondType::Single)
            .unwrap_or(true)
    };

    let all_bonds_single = |i: usize| -> bool {
        adj[i].iter().all(|&n| {
            bond_type_by_edge
                .get(&edge_key(i, n))
                .map(|bt| *bt == BondType::Single)
                .unwrap_or(true)
        })
    };

    let carbon_has_double_bonded_oxygen = |c: usize| -> bool {
        if mol.atoms[c].element != Carbon {
            return false;
        }
        adj[c]
            .iter()
            .any(|&n| mol.atoms[n].element == Oxygen && is_double_bond(c, n))
    };

    let oxygen_is_carboxylic_oh = |o: usize| -> bool {
        if mol.atoms[o].element != Oxygen || !has_h(o) {
            return false;
        }
        adj[o].iter().any(|&n| {
            mol.atoms[n].element == Carbon
                && is_single_bond(o, n)
                && carbon_has_double_bonded_oxygen(n)
        })
    };

    let nitrogen_is_amide = |n_i: usize| -> bool {
        if mol.atoms[n_i].element != Nitrogen {
            return false;
        }
        adj[n_i].iter().any(|&nbr| {
            mol.atoms[nbr].element == Carbon
                && is_single_bond(n_i, nbr)
                && carbon_has_double_bonded_oxygen(nbr)
        })
    };

    // Ring perception: 5- and 6-membered cycles cover the aromatic systems we care about.
    let mut rings = find_cycles_len(adj, 5);
    rings.extend(find_cycles_len(adj, 6));

    let is_kekule_aromatic_6 = |cyc: &[usize]| -> bool {
        if cyc.len() != 6 {
            return false;
        }
        // C and N only; alternating single/double around the ring.
        for &a in cyc {
            if mol.atoms[a].element != Carbon && mol.atoms[a].element != Nitrogen {
                return false;
            }
        }

        let mut kinds = [0u8; 6]; // 1=single, 2=double
        for k in 0..6 {
            let a = cyc[k];
            let b = cyc[(k + 1) % 6];
            let Some(bt) = bond_type_by_edge.get(&edge_key(a, b)) else {
                return false;
            };

            kinds[k] = match *bt {
                BondType::Single => 1,
                BondType::Double => 2,
                BondType::Aromatic => return true,
                _ => return false,
            };
        }

        (0..6).all(|k| kinds[k] != kinds[(k + 1) % 6])
    };

    let is_cycle_aromatic = |cyc: &[usize]| -> bool {
        let n = cyc.len();
        let all_bt_arom = (0..n).all(|k| {
            bond_type_by_edge
                .get(&edge_key(cyc[k], cyc[(k + 1) % n]))
                .map(|bt| *bt == BondType::Aromatic)
                .unwrap_or(false)
        });

        all_bt_arom || is_kekule_aromatic_6(cyc)
    };

    let aromatic_rings: Vec<Vec<usize>> = rings
        .iter()
        .filter(|c| is_cycle_aromatic(c.as_slice()))
        .cloned()
        .collect();

    let mut aromatic_atoms = HashSet::new();
    for ring in &aromatic_rings {
        aromatic_atoms.extend(ring.iter().copied());
    }

    let mut features = Vec::new();

    // Donors and acceptors.
    for (i, atom) in mol.atoms.iter().enumerate() {
        let positive = atom.formal_charge > 0;

        let donor = match atom.element {
            Oxygen | Nitrogen | Sulfur => has_h(i),
            _ => false,
        };
        if donor {
            features.push(Feature {
                family: FeatureFamily::Donor,
                posit: atom.posit,
            });
        }

        let acceptor = match atom.element {
            Oxygen => !positive && !oxygen_is_carboxylic_oh(i),
            // Pyrrole-like N (aromatic, H-bearing) has its lone pair in the ring; not an acceptor.
            Nitrogen => {
                !positive && !nitrogen_is_amide(i) && !(aromatic_atoms.contains(&i) && has_h(i))
            }
            Sulfur => {
                !positive
                    && adj[i].len() <= 2
                    && !adj[i]
                        .iter()
                        .any(|&n| mol.atoms[n].element == Oxygen && is_double_bond(i, n))
            }
            _ => false,
        };
        if acceptor {
            features.push(Feature {
                family: FeatureFamily::Acceptor,
                posit: atom.posit,
            });
        }
    }

    // NegIonizable: carboxylic acids / carboxylates, placed between the two oxygens.
    let mut carboxylate_os = HashSet::new();
    for c in 0..mol.atoms.len() {
        if mol.atoms[c].element != Carbon {
            continue;
        }

        let mut o_double = None;
        let mut o_single = None;
        for &n in &adj[c] {
            if mol.atoms[n].element != Oxygen {
                continue;
            }
            if is_double_bond(c, n) {
                o_double = Some(n);
            } else if is_single_bond(c, n)
                && (has_h(n) || mol.atoms[n].formal_charge < 0 || adj[n].len() == 1)
            {
                o_single = Some(n);
            }
        }

        if let (Some(od), Some(os)) = (o_double, o_single) {
            carboxylate_os.insert(od);
            carboxylate_os.insert(os);
            features.push(Feature {
                family: FeatureFamily::NegIonizable,
                posit: centroid(mol, &[od, os]),
            });
        }
    }

    for (i, atom) in mol.atoms.iter().enumerate() {
        if atom.formal_charge < 0 && !carboxylate_os.contains(&i) {
            features.push(Feature {
                family: FeatureFamily::NegIonizable,
                posit: atom.posit,
            });
        }
    }

    // PosIonizable: explicit positive charges, guanidinium carbons, basic amines.
    for (i, atom) in mol.atoms.iter().enumerate() {
        if atom.formal_charge > 0 {
            features.push(Feature {
                family: FeatureFamily::PosIonizable,
                posit: atom.posit,
            });
            continue;
        }

        match atom.element {
            Carbon => {
                let n_nitrogen = adj[i]
                    .iter()
                    .filter(|&&n| mol.atoms[n].element == Nitrogen)
                    .count();
                if n_nitrogen >= 3 {
                    features.push(Feature {
                        family: FeatureFamily::PosIonizable,
                        posit: atom.posit,
                    });
                }
            }
            Nitrogen => {
                // Amide, aniline, amidine/guanidine N are all excluded: only an sp3 N with
                // plain carbon substituents holds a proton at physiological pH.
                let basic = !nitrogen_is_amide(i)
                    && !aromatic_atoms.contains(&i)
                    && all_bonds_single(i)
                    && adj[i].iter().all(|&n| {
                        matches!(mol.atoms[n].element, Carbon | Hydrogen)
                            && !aromatic_atoms.contains(&n)
                            && !adj[n].iter().any(|&m| {
                                matches!(mol.atoms[m].element, Nitrogen | Oxygen | Sulfur)
                                    && is_double_bond(n, m)
                            })
                    });
                if basic {
                    features.push(Feature {
                        family: FeatureFamily::PosIonizable,
                        posit: atom.posit,
                    });
                }
            }
            _ => {}
        }
    }

    // One aromatic feature per ring, at its centroid.
    for ring in &aromatic_rings {
        features.push(Feature {
            family: FeatureFamily::Aromatic,
            posit: centroid(mol, ring),
        });
    }

    // Hydrophobes: carbons with no polar contacts, and heavy halogens on carbon.
    let mut hydrophobic = vec![false; mol.atoms.len()];
    for (i, atom) in mol.atoms.iter().enumerate() {
        hydrophobic[i] = match atom.element {
            Carbon => {
                atom.formal_charge == 0
                    && adj[i].iter().all(|&n| {
                        matches!(
                            mol.atoms[n].element,
                            Carbon | Hydrogen | Sulfur | Fluorine | Chlorine | Bromine | Iodine
                        )
                    })
            }
            Chlorine | Bromine | Iodine => adj[i]
                .iter()
                .any(|&n| mol.atoms[n].element == Carbon),
            _ => false,
        };

        if hydrophobic[i] {
            features.push(Feature {
                family: FeatureFamily::Hydrophobe,
                posit: atom.posit,
            });
        }
    }

    // Lumped hydrophobes: connected patches of 3+ hydrophobic atoms, at the patch centroid.
    let mut seen = vec![false; mol.atoms.len()];
    for start in 0..mol.atoms.len() {
        if !hydrophobic[start] || seen[start] {
            continue;
        }

        let mut component = Vec::new();
        let mut queue = vec![start];
        seen[start] = true;
        while let Some(u) = queue.pop() {
            component.push(u);
            for &v in &adj[u] {
                if hydrophobic[v] && !seen[v] {
                    seen[v] = true;
                    queue.push(v);
                }
            }
        }

        if component.len() >= 3 {
            features.push(Feature {
                family: FeatureFamily::LumpedHydrophobe,
                posit: centroid(mol, &component),
            });
        }
    }

    // Distinct sources can land on the same point (e.g. a charged atom matched twice);
    // keep the first.
    let mut kept: Vec<Feature> = Vec::with_capacity(features.len());
    for f in features {
        let dup = kept.iter().any(|k| {
            k.family == f.family
                && k.posit.x == f.posit.x
                && k.posit.y == f.posit.y
                && k.posit.z == f.posit.z
        });
        if !dup {
            kept.push(f);
        }
    }

    Ok(kept)
}
