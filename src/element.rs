use std::{io, io::ErrorKind};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Element {
    Hydrogen,
    Carbon,
    Oxygen,
    Nitrogen,
    Fluorine,
    Sulfur,
    Phosphorus,
    Boron,
    Sodium,
    Iron,
    Copper,
    Calcium,
    Potassium,
    Zinc,
    Magnesium,
    Manganese,
    Iodine,
    Chlorine,
    Selenium,
    Bromine,
    Other,
}

impl Element {
    /// Typical bonding valence. Used to infer implicit hydrogen counts on heavy atoms
    /// when an SDF omits explicit hydrogens.
    pub fn valence_typical(&self) -> usize {
        match self {
            Self::Hydrogen => 1,
            Self::Carbon => 4,
            Self::Oxygen => 2,
            Self::Nitrogen => 3,
            Self::Fluorine => 1,
            Self::Sulfur => 2, // can be 2, 4, or 6; 2 covers thiols and thioethers
            Self::Phosphorus => 3,
            Self::Boron => 3,
            Self::Iodine => 1,
            Self::Chlorine => 1,
            Self::Bromine => 1,
            Self::Selenium => 2,
            // Metals and anything else: no implicit hydrogens.
            _ => 0,
        }
    }

    pub fn from_letter(letter: &str) -> io::Result<Self> {
        match letter.to_uppercase().as_ref() {
            "H" => Ok(Self::Hydrogen),
            "C" => Ok(Self::Carbon),
            "O" => Ok(Self::Oxygen),
            "N" => Ok(Self::Nitrogen),
            "F" => Ok(Self::Fluorine),
            "S" => Ok(Self::Sulfur),
            "P" => Ok(Self::Phosphorus),
            "B" => Ok(Self::Boron),
            "NA" => Ok(Self::Sodium),
            "FE" => Ok(Self::Iron),
            "CU" => Ok(Self::Copper),
            "CA" => Ok(Self::Calcium),
            "K" => Ok(Self::Potassium),
            "ZN" => Ok(Self::Zinc),
            "MG" => Ok(Self::Magnesium),
            "MN" => Ok(Self::Manganese),
            "I" => Ok(Self::Iodine),
            "CL" => Ok(Self::Chlorine),
            "SE" => Ok(Self::Selenium),
            "BR" => Ok(Self::Bromine),
            _ => Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("Invalid atom letter: {letter}"),
            )),
        }
    }

    pub fn to_letter(&self) -> String {
        match self {
            Self::Hydrogen => "H".into(),
            Self::Carbon => "C".into(),
            Self::Oxygen => "O".into(),
            Self::Nitrogen => "N".into(),
            Self::Fluorine => "F".into(),
            Self::Sulfur => "S".into(),
            Self::Phosphorus => "P".into(),
            Self::Boron => "B".into(),
            Self::Sodium => "Na".into(),
            Self::Iron => "Fe".into(),
            Self::Copper => "Cu".into(),
            Self::Calcium => "Ca".into(),
            Self::Potassium => "K".into(),
            Self::Zinc => "Zn".into(),
            Self::Magnesium => "Mg".into(),
            Self::Manganese => "Mn".into(),
            Self::Iodine => "I".into(),
            Self::Chlorine => "Cl".into(),
            Self::Selenium => "Se".into(),
            Self::Bromine => "Br".into(),
            Self::Other => "X".into(),
        }
    }

    #[rustfmt::skip]
    /// Covalent radius, in angstrom.
    /// https://github.com/openbabel/openbabel/blob/master/src/elementtable.h
    /// https://en.wikipedia.org/wiki/Atomic_radii_of_the_elements_(data_page)
    pub fn covalent_radius(self) -> f64 {
        match self {
            Element::Hydrogen   => 0.31,
            Element::Carbon     => 0.76,
            Element::Oxygen     => 0.66,
            Element::Nitrogen   => 0.71,
            Element::Fluorine   => 0.57,
            Element::Sulfur     => 1.05,
            Element::Phosphorus => 1.07,
            Element::Boron      => 0.84,
            Element::Sodium     => 1.66,
            Element::Iron       => 1.32,
            Element::Copper     => 1.32,
            Element::Calcium    => 1.76,
            Element::Potassium  => 2.03,
            Element::Zinc       => 1.22,
            Element::Magnesium  => 1.41,
            Element::Manganese  => 1.39,
            Element::Iodine     => 1.39,
            Element::Chlorine   => 1.02,
            Element::Selenium   => 1.20,
            Element::Bromine    => 1.14,
            Element::Other      => 0.00,
        }
    }

    #[rustfmt::skip]
    /// Van-der-waals radius, in angstrom.
    /// https://github.com/openbabel/openbabel/blob/master/src/elementtable.h
    /// https://en.wikipedia.org/wiki/Atomic_radii_of_the_elements_(data_page)
    pub const fn vdw_radius(&self) -> f32 {
        match self {
            Element::Hydrogen   => 1.10,
            Element::Carbon     => 1.70,
            Element::Oxygen     => 1.52,
            Element::Nitrogen   => 1.55,
            Element::Fluorine   => 1.47,
            Element::Sulfur     => 1.80,
            Element::Phosphorus => 1.80,
            Element::Boron      => 1.92,
            Element::Sodium     => 2.27,
            Element::Iron       => 2.05,
            Element::Copper     => 2.00,
            Element::Calcium    => 2.31,
            Element::Potassium  => 2.75,
            Element::Zinc       => 2.10,
            Element::Magnesium  => 1.73,
            Element::Manganese  => 2.05,
            Element::Iodine     => 1.98,
            Element::Chlorine   => 1.75,
            Element::Selenium   => 1.90,
            Element::Bromine    => 1.85,
            Element::Other      => 0.0,
        }
    }
}
