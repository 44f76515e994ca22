//! Multi-record Structure Data Format (SDF) reading and writing, V2000 connection tables.
//! Records are delimited by `$$$$`; each carries a molecule plus free-form data fields,
//! which we preserve so score annotations land alongside whatever the file already had.

use std::{
    io,
    io::{BufRead, ErrorKind, Write},
};

use lin_alg::f64::Vec3;

use crate::{
    element::Element,
    molecule::{Atom, Bond, BondType, Molecule},
};

/// Streams molecules out of a (possibly concatenated, possibly huge) SDF. One malformed
/// record yields an `Err` for that record only; iteration continues with the next record.
pub struct SdfReader<R: BufRead> {
    reader: R,
    done: bool,
}

impl<R: BufRead> SdfReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            done: false,
        }
    }

    /// Pull lines up to the next `$$$$` delimiter, or EOF. None on end of input.
    fn next_record(&mut self) -> io::Result<Option<Vec<String>>> {
        let mut lines = Vec::new();
        let mut buf = String::new();

        loop {
            buf.clear();
            let n = self.reader.read_line(&mut buf)?;

            if n == 0 {
                if lines.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(lines));
            }

            let line = buf.trim_end_matches(['\r', '\n']);
            if line.trim() == "$$$$" {
                return Ok(Some(lines));
            }
            lines.push(line.to_string());
        }
    }
}

impl<R: BufRead> Iterator for SdfReader<R> {
    type Item = io::Result<Molecule>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.next_record() {
                Ok(Some(lines)) => {
                    // Blank filler between delimiters, or a trailing newline run: not a record.
                    if lines.iter().all(|l| l.trim().is_empty()) {
                        continue;
                    }
                    return Some(parse_record(&lines));
                }
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// V2000 atom-block charge codes. 4 means a doublet radical, not a charge.
fn charge_from_code(code: &str) -> i8 {
    match code {
        "1" => 3,
        "2" => 2,
        "3" => 1,
        "5" => -1,
        "6" => -2,
        "7" => -3,
        _ => 0,
    }
}

fn parse_record(lines: &[String]) -> io::Result<Molecule> {
    // SDF records have at least 4 lines before the atom block:
    //   1) A title or identifier
    //   2) Program/comment line
    //   3) Usually blank
    //   4) "counts" line: e.g. " 50 50  0  ..." for V2000
    if lines.len() < 4 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "Not enough lines to parse an SDF header",
        ));
    }

    let ident = lines[0].trim().to_string();

    let counts_line = &lines[3];
    let counts_cols: Vec<&str> = counts_line.split_whitespace().collect();

    if counts_cols.len() < 2 {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            "Counts line doesn't have enough fields",
        ));
    }

    let n_atoms = counts_cols[0]
        .parse::<usize>()
        .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Could not parse number of atoms"))?;
    let n_bonds = counts_cols[1]
        .parse::<usize>()
        .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Could not parse number of bonds"))?;

    let first_atom_line = 4;
    let last_atom_line = first_atom_line + n_atoms;
    let first_bond_line = last_atom_line;
    let last_bond_line = first_bond_line + n_bonds;

    if lines.len() < last_bond_line {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!(
                "Not enough lines for the declared atom and bond blocks: have {}, need {}",
                lines.len(),
                last_bond_line
            ),
        ));
    }

    let mut atoms = Vec::with_capacity(n_atoms);

    for i in first_atom_line..last_atom_line {
        let cols: Vec<&str> = lines[i].split_whitespace().collect();

        if cols.len() < 4 {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("Atom line {i} does not have enough columns"),
            ));
        }

        let x = cols[0]
            .parse::<f64>()
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Could not parse X coordinate"))?;
        let y = cols[1]
            .parse::<f64>()
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Could not parse Y coordinate"))?;
        let z = cols[2]
            .parse::<f64>()
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Could not parse Z coordinate"))?;

        // Col 4 is the mass difference; col 5 the legacy charge code.
        let formal_charge = if cols.len() > 5 {
            charge_from_code(cols[5])
        } else {
            0
        };

        atoms.push(Atom {
            serial_number: (i - first_atom_line) as u32 + 1,
            posit: Vec3 { x, y, z },
            element: Element::from_letter(cols[3])?,
            formal_charge,
        });
    }

    let mut bonds = Vec::with_capacity(n_bonds);

    for i in first_bond_line..last_bond_line {
        let cols: Vec<&str> = lines[i].split_whitespace().collect();

        if cols.len() < 3 {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("Bond line {i} does not have enough columns"),
            ));
        }

        let atom_0_sn = cols[0]
            .parse::<usize>()
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Could not parse bond atom 0"))?;
        let atom_1_sn = cols[1]
            .parse::<usize>()
            .map_err(|_| io::Error::new(ErrorKind::InvalidData, "Could not parse bond atom 1"))?;

        if atom_0_sn == 0 || atom_0_sn > n_atoms || atom_1_sn == 0 || atom_1_sn > n_atoms {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("Bond indices out of bounds: {atom_0_sn}, {atom_1_sn} (atoms: {n_atoms})"),
            ));
        }

        bonds.push(Bond {
            bond_type: BondType::from_sdf(cols[2])?,
            atom_0: atom_0_sn - 1,
            atom_1: atom_1_sn - 1,
        });
    }

    // Property block: `M  CHG` lines override every atom-block charge code, per V2000.
    let mut m_end = None;
    let mut saw_chg = false;

    for (i, line) in lines.iter().enumerate().skip(last_bond_line) {
        let trimmed = line.trim_end();

        if trimmed == "M  END" {
            m_end = Some(i);
            break;
        }

        if let Some(rest) = trimmed.strip_prefix("M  CHG") {
            if !saw_chg {
                saw_chg = true;
                for atom in &mut atoms {
                    atom.formal_charge = 0;
                }
            }

            let toks: Vec<&str> = rest.split_whitespace().collect();
            // First token is the pair count; the rest are (atom serial, charge) pairs.
            for pair in toks.get(1..).unwrap_or(&[]).chunks(2) {
                if pair.len() != 2 {
                    return Err(io::Error::new(
                        ErrorKind::InvalidData,
                        "Unpaired values in M  CHG line",
                    ));
                }
                let sn = pair[0].parse::<usize>().map_err(|_| {
                    io::Error::new(ErrorKind::InvalidData, "Bad atom index in M  CHG line")
                })?;
                let charge = pair[1].parse::<i8>().map_err(|_| {
                    io::Error::new(ErrorKind::InvalidData, "Bad charge in M  CHG line")
                })?;

                if sn == 0 || sn > atoms.len() {
                    return Err(io::Error::new(
                        ErrorKind::InvalidData,
                        format!("M  CHG atom index out of bounds: {sn}"),
                    ));
                }
                atoms[sn - 1].formal_charge = charge;
            }
        }
    }

    // Data fields. Each is a `> <KEY>` header followed by value lines, ended by a blank line.
    let mut metadata = Vec::new();
    let mut idx = match m_end {
        Some(i) => i + 1,
        None => last_bond_line,
    };

    while idx < lines.len() {
        let line = lines[idx].trim_end();

        if line.starts_with('>')
            && let (Some(l), Some(r)) = (line.find('<'), line.rfind('>'))
            && r > l + 1
        {
            let key = line[l + 1..r].to_string();
            idx += 1;

            let mut vals: Vec<&str> = Vec::new();
            while idx < lines.len() {
                let v = lines[idx].trim_end();
                if v.is_empty() || v.starts_with("> <") {
                    break;
                }
                vals.push(v);
                idx += 1;
            }

            metadata.push((key, vals.join("\n")));
            continue;
        }
        idx += 1;
    }

    Ok(Molecule::new(ident, atoms, bonds, metadata))
}

/// Write one molecule as an SDF record, including its data fields and the `$$$$` delimiter.
pub fn write_record(w: &mut dyn Write, mol: &Molecule) -> io::Result<()> {
    writeln!(w, "{}", mol.ident)?;
    writeln!(w)?;
    writeln!(w)?;

    writeln!(
        w,
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
        mol.atoms.len(),
        mol.bonds.len()
    )?;

    for atom in &mol.atoms {
        writeln!(
            w,
            "{:>10.4}{:>10.4}{:>10.4} {:<2}  0  0  0  0  0  0  0  0  0  0",
            atom.posit.x,
            atom.posit.y,
            atom.posit.z,
            atom.element.to_letter(),
        )?;
    }

    for bond in &mol.bonds {
        writeln!(
            w,
            "{:>3}{:>3}{:>3}  0  0  0  0",
            bond.atom_0 + 1,
            bond.atom_1 + 1,
            bond.bond_type.to_sdf()
        )?;
    }

    let charged: Vec<&Atom> = mol.atoms.iter().filter(|a| a.formal_charge != 0).collect();
    for chunk in charged.chunks(8) {
        let mut line = format!("M  CHG{:>3}", chunk.len());
        for atom in chunk {
            line += &format!("{:>4}{:>4}", atom.serial_number, atom.formal_charge);
        }
        writeln!(w, "{line}")?;
    }

    writeln!(w, "M  END")?;

    for (key, val) in &mol.metadata {
        writeln!(w, "> <{key}>")?;
        writeln!(w, "{val}")?;
        writeln!(w)?;
    }

    writeln!(w, "$$$$")?;

    Ok(())
}
