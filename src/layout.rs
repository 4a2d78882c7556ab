use crate::attributes::ElementKind;
use byteorder::{LittleEndian, ReadBytesExt};
use std::convert::TryFrom;

/// Word size of every integer and float in the file.
pub(crate) const RECORD_SIZE: u64 = 4;
/// Dates are stored as 8 byte doubles.
pub(crate) const DATE_SIZE: u64 = 8;
/// Length of the trailing epilogue.
pub(crate) const EPILOGUE_SIZE: usize = 24;
/// Length of the six word header following the leading magic number.
pub(crate) const HEADER_SIZE: usize = 24;

/// Converts the last 24 bytes of an output file into an `Epilogue`.
///
/// ```text
/// Bytes       Content
/// -----       -------
/// 0-3         IDPos (int)
/// 4-7         ObjPropPos (int)
/// 8-11        ResultsPos (int)
/// 12-15       Nperiods (int)
/// 16-19      error code the run terminated with (int)
/// 20-23       magic number (int)
/// ```
#[derive(Clone, Debug)]
pub(crate) struct Epilogue {
    pub(crate) id_pos: u32,
    pub(crate) obj_prop_pos: u32,
    pub(crate) results_pos: u32,
    pub(crate) n_periods: i32,
    pub(crate) error_code: i32,
    pub(crate) magic: u32,
}

impl TryFrom<&[u8]> for Epilogue {
    type Error = &'static str;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != EPILOGUE_SIZE {
            return Err("Epilogue must be 24 bytes.");
        }

        let mut bytes = bytes;
        Ok(Self {
            id_pos: bytes.read_u32::<LittleEndian>().unwrap(),
            obj_prop_pos: bytes.read_u32::<LittleEndian>().unwrap(),
            results_pos: bytes.read_u32::<LittleEndian>().unwrap(),
            n_periods: bytes.read_i32::<LittleEndian>().unwrap(),
            error_code: bytes.read_i32::<LittleEndian>().unwrap(),
            magic: bytes.read_u32::<LittleEndian>().unwrap(),
        })
    }
}

/// Converts the six words after the leading magic number into a `Header`.
///
/// ```text
/// Bytes       Content
/// -----       -------
/// 0-3         version (int)
/// 4-7         flow units code (int)
/// 8-11        number of subcatchments (int)
/// 12-15       number of nodes (int)
/// 16-19       number of links (int)
/// 20-23       number of pollutants (int)
/// ```
#[derive(Clone, Debug)]
pub(crate) struct Header {
    pub(crate) version: i32,
    pub(crate) flow_units: i32,
    pub(crate) n_subcatch: u32,
    pub(crate) n_nodes: u32,
    pub(crate) n_links: u32,
    pub(crate) n_pollut: u32,
}

impl Header {
    /// Size in bytes of the stored input properties: subcatchment areas,
    /// node types/inverts/max depths, and link types/ends/geometries.
    /// The reader skips over them to reach the variable-code lists.
    pub(crate) fn input_properties_size(&self) -> u64 {
        let records = u64::from(self.n_subcatch) + 2
            + 3 * u64::from(self.n_nodes) + 4
            + 5 * u64::from(self.n_links) + 6;
        records * RECORD_SIZE
    }
}

impl TryFrom<&[u8]> for Header {
    type Error = &'static str;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != HEADER_SIZE {
            return Err("Header must be 24 bytes.");
        }

        let mut bytes = bytes;
        Ok(Self {
            version: bytes.read_i32::<LittleEndian>().unwrap(),
            flow_units: bytes.read_i32::<LittleEndian>().unwrap(),
            n_subcatch: bytes.read_u32::<LittleEndian>().unwrap(),
            n_nodes: bytes.read_u32::<LittleEndian>().unwrap(),
            n_links: bytes.read_u32::<LittleEndian>().unwrap(),
            n_pollut: bytes.read_u32::<LittleEndian>().unwrap(),
        })
    }
}

/// Pure byte arithmetic over the tightly packed results section.
///
/// Periods lie contiguously from `results_pos`, each one an 8 byte
/// timestamp followed by the subcatchment, node and link blocks in
/// row-major order (entity, then variable) and the flat system block.
/// One descriptor per kind (records before its block, variables per
/// entity, entity count) turns every query into the same formula.
#[derive(Clone, Debug)]
pub(crate) struct ResultsLayout {
    results_pos: u64,
    bytes_per_period: u64,
    counts: [u64; 4],
    vars: [u64; 4],
}

impl ResultsLayout {
    pub(crate) fn new(results_pos: u32, counts: [u32; 3], vars: [u32; 4]) -> Self {
        let counts = [
            u64::from(counts[0]),
            u64::from(counts[1]),
            u64::from(counts[2]),
            // the system aggregate is a singleton
            1,
        ];
        let vars = [
            u64::from(vars[0]),
            u64::from(vars[1]),
            u64::from(vars[2]),
            u64::from(vars[3]),
        ];

        let records_per_period: u64 = counts.iter().zip(vars.iter()).map(|(c, v)| c * v).sum();
        Self {
            results_pos: u64::from(results_pos),
            bytes_per_period: DATE_SIZE + records_per_period * RECORD_SIZE,
            counts,
            vars,
        }
    }

    pub(crate) fn bytes_per_period(&self) -> u64 {
        self.bytes_per_period
    }

    /// Entities of a kind stored per period (1 for the system aggregate).
    pub(crate) fn count(&self, kind: ElementKind) -> u64 {
        self.counts[kind as usize]
    }

    /// Variables stored per entity of a kind.
    pub(crate) fn vars(&self, kind: ElementKind) -> u64 {
        self.vars[kind as usize]
    }

    /// Absolute offset of a period's leading timestamp.
    pub(crate) fn timestamp_offset(&self, period: u32) -> u64 {
        self.results_pos + u64::from(period) * self.bytes_per_period
    }

    fn block_base(&self, kind: ElementKind) -> u64 {
        self.counts
            .iter()
            .zip(self.vars.iter())
            .take(kind as usize)
            .map(|(c, v)| c * v)
            .sum()
    }

    /// Absolute offset of one scalar: period `period`, entity `index` of
    /// `kind`, column `ordinal`.
    pub(crate) fn scalar_offset(&self, period: u32, kind: ElementKind, index: u64, ordinal: u64) -> u64 {
        self.timestamp_offset(period)
            + DATE_SIZE
            + (self.block_base(kind) + index * self.vars[kind as usize] + ordinal) * RECORD_SIZE
    }

    /// Absolute offset of an entity's whole row of variables.
    pub(crate) fn row_offset(&self, period: u32, kind: ElementKind, index: u64) -> u64 {
        self.scalar_offset(period, kind, index, 0)
    }
}
