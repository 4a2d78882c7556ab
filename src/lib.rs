#![warn(rust_2018_idioms)]

mod attributes;
pub mod datetime;
mod error;
mod layout;

pub use crate::attributes::{
    ElementCount, ElementKind, LinkAttribute, NodeAttribute, SubcatchAttribute, SystemAttribute,
};
pub use crate::error::Error;

use crate::datetime::DateTime;
use crate::layout::{Epilogue, Header, ResultsLayout, DATE_SIZE, EPILOGUE_SIZE, HEADER_SIZE, RECORD_SIZE};
use async_std::fs::File;
use async_std::io::prelude::*;
use async_std::io::SeekFrom;
use async_std::path::{Path, PathBuf};
use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, trace};
use std::convert::TryFrom;

type Result<T> = std::result::Result<T, Error>;

/// A random access reader over one SWMM binary output file.
///
/// The handle owns the file and its cursor; every query seeks absolutely
/// before reading, so queries may be issued in any order. Dropping the
/// handle releases the file and the materialised element names. Callers
/// wanting parallel reads open one handle per reader.
#[derive(Debug)]
pub struct SwmmOutput {
    reader: SectionReader,
    header: Header,
    epilogue: Epilogue,
    layout: ResultsLayout,
    start_date: DateTime,
    report_step: i32,
    element_names: Option<Vec<String>>,
}

impl SwmmOutput {
    /// Opens an output file and reads its epilogue and header.
    ///
    /// The last 24 bytes anchor everything else: they carry the section
    /// offsets, the period count, the error code the run terminated with,
    /// and the authoritative copy of the magic number.
    pub async fn open<P>(p: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let mut path = PathBuf::new();
        path.push(p);

        let file = File::open(&path).await.map_err(|_| Error::FileUnopenable)?;
        let mut reader = SectionReader::new(file);

        let mut buffer = [0u8; EPILOGUE_SIZE];
        reader.read_at_end(&mut buffer).await?;
        let epilogue = Epilogue::try_from(&buffer[..]).unwrap();

        let leading_magic = reader.read_u32_at(0).await?;
        if leading_magic != epilogue.magic {
            return Err(Error::NotASwmmOutputFile);
        }
        if epilogue.error_code != 0 {
            return Err(Error::RunTerminatedNoResults);
        }
        if epilogue.n_periods <= 0 {
            return Err(Error::NoResults);
        }

        let mut buffer = [0u8; HEADER_SIZE];
        reader.read_at(RECORD_SIZE, &mut buffer).await?;
        let header = Header::try_from(&buffer[..]).unwrap();

        // The per-kind variable code lists sit behind the stored input
        // properties. Each list is its length followed by that many
        // attribute codes, which the reader does not interpret.
        let mut offset = u64::from(epilogue.obj_prop_pos) + header.input_properties_size();
        let subcatch_vars = reader.read_u32_at(offset).await?;
        offset += RECORD_SIZE * (1 + u64::from(subcatch_vars));
        let node_vars = reader.read_u32_at(offset).await?;
        offset += RECORD_SIZE * (1 + u64::from(node_vars));
        let link_vars = reader.read_u32_at(offset).await?;
        offset += RECORD_SIZE * (1 + u64::from(link_vars));
        let system_vars = reader.read_u32_at(offset).await?;

        // Start date and report step sit just before the first period.
        let offset = u64::from(epilogue.results_pos)
            .checked_sub(DATE_SIZE + RECORD_SIZE)
            .ok_or(Error::NotASwmmOutputFile)?;
        let start_date = reader.read_f64_at(offset).await?;
        let report_step = reader.read_i32_at(offset + DATE_SIZE).await?;

        let layout = ResultsLayout::new(
            epilogue.results_pos,
            [header.n_subcatch, header.n_nodes, header.n_links],
            [subcatch_vars, node_vars, link_vars, system_vars],
        );

        debug!(
            "opened {} with {} periods of {} bytes each",
            path.display(),
            epilogue.n_periods,
            layout.bytes_per_period()
        );

        Ok(Self {
            reader,
            header,
            epilogue,
            layout,
            start_date,
            report_step,
            element_names: None,
        })
    }

    /// Number of elements in the requested population.
    pub fn project_size(&self, count: ElementCount) -> usize {
        match count {
            ElementCount::Subcatchments => self.header.n_subcatch as usize,
            ElementCount::Nodes => self.header.n_nodes as usize,
            ElementCount::Links => self.header.n_links as usize,
            ElementCount::Pollutants => self.header.n_pollut as usize,
        }
    }

    /// Version word the simulator wrote into the header.
    pub fn version(&self) -> i32 {
        self.header.version
    }

    /// Flow unit code, echoed back as the file stores it.
    pub fn flow_units(&self) -> i32 {
        self.header.flow_units
    }

    /// Simulation start, in decimal days since 1899-12-30.
    pub fn start_date(&self) -> DateTime {
        self.start_date
    }

    /// Reporting step in seconds.
    pub fn report_step(&self) -> i32 {
        self.report_step
    }

    /// Number of reported periods. Always positive for an open handle.
    pub fn n_periods(&self) -> u32 {
        self.epilogue.n_periods as u32
    }

    /// Name of element `index` of `kind`.
    ///
    /// The ID table is materialised on first use and lives for the life
    /// of the handle. The fourth population holds the pollutant names;
    /// the system aggregate itself is anonymous, so on a file without
    /// pollutants every `System` index is out of range.
    pub async fn element_name(&mut self, kind: ElementKind, index: usize) -> Result<&str> {
        let (base, count) = match kind {
            ElementKind::Subcatch => (0, self.header.n_subcatch),
            ElementKind::Node => (self.header.n_subcatch, self.header.n_nodes),
            ElementKind::Link => (self.header.n_subcatch + self.header.n_nodes, self.header.n_links),
            ElementKind::System => (
                self.header.n_subcatch + self.header.n_nodes + self.header.n_links,
                self.header.n_pollut,
            ),
        };
        if index >= count as usize {
            return Err(Error::OutOfRange);
        }

        self.ensure_element_names().await?;
        let names = self.element_names.as_ref().unwrap();
        Ok(&names[base as usize + index])
    }

    async fn ensure_element_names(&mut self) -> Result<()> {
        if self.element_names.is_some() {
            return Ok(());
        }

        let total = (self.header.n_subcatch
            + self.header.n_nodes
            + self.header.n_links
            + self.header.n_pollut) as usize;
        trace!("materialising {} element names", total);

        let mut names = Vec::with_capacity(total);
        let mut offset = u64::from(self.epilogue.id_pos);
        for _ in 0..total {
            let length = self.reader.read_u32_at(offset).await? as usize;
            offset += RECORD_SIZE;

            let mut bytes = vec![0u8; length];
            self.reader.read_at(offset, &mut bytes).await?;
            offset += length as u64;

            let (name, _, _) = encoding_rs::UTF_8.decode(&bytes);
            names.push(name.into_owned());
        }

        self.element_names = Some(names);
        Ok(())
    }

    /// Timestamp of one period, in decimal days since 1899-12-30.
    ///
    /// Period 0 reports the state at `start_date` plus one report step.
    pub async fn period_date(&mut self, period: u32) -> Result<DateTime> {
        self.check_period(period)?;
        self.reader
            .read_f64_at(self.layout.timestamp_offset(period))
            .await
    }

    /// Time series of one subcatchment attribute.
    ///
    /// `end_period` is an exclusive period index, not a series length:
    /// the returned series covers `min(end_period - start_period,
    /// n_periods)` periods starting at `start_period`.
    pub async fn subcatch_series(
        &mut self,
        subcatch: usize,
        attribute: SubcatchAttribute,
        start_period: u32,
        end_period: u32,
    ) -> Result<Vec<f32>> {
        self.series(ElementKind::Subcatch, subcatch, attribute.index(), start_period, end_period)
            .await
    }

    /// Time series of one node attribute. See
    /// [`subcatch_series`](SwmmOutput::subcatch_series) for the meaning
    /// of `end_period`.
    pub async fn node_series(
        &mut self,
        node: usize,
        attribute: NodeAttribute,
        start_period: u32,
        end_period: u32,
    ) -> Result<Vec<f32>> {
        self.series(ElementKind::Node, node, attribute.index(), start_period, end_period)
            .await
    }

    /// Time series of one link attribute. See
    /// [`subcatch_series`](SwmmOutput::subcatch_series) for the meaning
    /// of `end_period`.
    pub async fn link_series(
        &mut self,
        link: usize,
        attribute: LinkAttribute,
        start_period: u32,
        end_period: u32,
    ) -> Result<Vec<f32>> {
        self.series(ElementKind::Link, link, attribute.index(), start_period, end_period)
            .await
    }

    /// Time series of one system attribute. See
    /// [`subcatch_series`](SwmmOutput::subcatch_series) for the meaning
    /// of `end_period`.
    pub async fn system_series(
        &mut self,
        attribute: SystemAttribute,
        start_period: u32,
        end_period: u32,
    ) -> Result<Vec<f32>> {
        self.series(ElementKind::System, 0, attribute.index(), start_period, end_period)
            .await
    }

    /// One attribute across all subcatchments at one period.
    pub async fn subcatch_attribute(
        &mut self,
        period: u32,
        attribute: SubcatchAttribute,
    ) -> Result<Vec<f32>> {
        self.attribute(ElementKind::Subcatch, period, attribute.index())
            .await
    }

    /// One attribute across all nodes at one period.
    pub async fn node_attribute(&mut self, period: u32, attribute: NodeAttribute) -> Result<Vec<f32>> {
        self.attribute(ElementKind::Node, period, attribute.index())
            .await
    }

    /// One attribute across all links at one period.
    pub async fn link_attribute(&mut self, period: u32, attribute: LinkAttribute) -> Result<Vec<f32>> {
        self.attribute(ElementKind::Link, period, attribute.index())
            .await
    }

    /// One system attribute at one period.
    pub async fn system_attribute(&mut self, period: u32, attribute: SystemAttribute) -> Result<f32> {
        let values = self
            .attribute(ElementKind::System, period, attribute.index())
            .await?;
        Ok(values[0])
    }

    /// All variables of one subcatchment at one period, in column order.
    pub async fn subcatch_result(&mut self, period: u32, subcatch: usize) -> Result<Vec<f32>> {
        self.row(ElementKind::Subcatch, period, subcatch).await
    }

    /// All variables of one node at one period, in column order.
    pub async fn node_result(&mut self, period: u32, node: usize) -> Result<Vec<f32>> {
        self.row(ElementKind::Node, period, node).await
    }

    /// All variables of one link at one period, in column order.
    pub async fn link_result(&mut self, period: u32, link: usize) -> Result<Vec<f32>> {
        self.row(ElementKind::Link, period, link).await
    }

    /// All system variables at one period, in column order.
    pub async fn system_result(&mut self, period: u32) -> Result<Vec<f32>> {
        self.row(ElementKind::System, period, 0).await
    }

    fn check_period(&self, period: u32) -> Result<()> {
        if period < self.n_periods() {
            Ok(())
        } else {
            Err(Error::OutOfRange)
        }
    }

    fn check_element(&self, kind: ElementKind, index: usize) -> Result<u64> {
        if (index as u64) < self.layout.count(kind) {
            Ok(index as u64)
        } else {
            Err(Error::OutOfRange)
        }
    }

    fn check_ordinal(&self, kind: ElementKind, ordinal: usize) -> Result<u64> {
        if (ordinal as u64) < self.layout.vars(kind) {
            Ok(ordinal as u64)
        } else {
            Err(Error::OutOfRange)
        }
    }

    /// One absolute seek and one read per scalar; no state is carried
    /// between queries, so query order never affects results.
    async fn scalar(&mut self, period: u32, kind: ElementKind, index: u64, ordinal: u64) -> Result<f32> {
        self.reader
            .read_f32_at(self.layout.scalar_offset(period, kind, index, ordinal))
            .await
    }

    async fn series(
        &mut self,
        kind: ElementKind,
        index: usize,
        ordinal: usize,
        start_period: u32,
        end_period: u32,
    ) -> Result<Vec<f32>> {
        let index = self.check_element(kind, index)?;
        let ordinal = self.check_ordinal(kind, ordinal)?;

        let length = end_period.saturating_sub(start_period).min(self.n_periods());
        if length == 0 {
            return Ok(Vec::new());
        }
        if u64::from(start_period) + u64::from(length) > u64::from(self.n_periods()) {
            return Err(Error::OutOfRange);
        }

        let mut values = Vec::with_capacity(length as usize);
        for period in start_period..start_period + length {
            values.push(self.scalar(period, kind, index, ordinal).await?);
        }
        Ok(values)
    }

    async fn attribute(&mut self, kind: ElementKind, period: u32, ordinal: usize) -> Result<Vec<f32>> {
        self.check_period(period)?;
        let ordinal = self.check_ordinal(kind, ordinal)?;

        let count = self.layout.count(kind);
        let mut values = Vec::with_capacity(count as usize);
        for index in 0..count {
            values.push(self.scalar(period, kind, index, ordinal).await?);
        }
        Ok(values)
    }

    async fn row(&mut self, kind: ElementKind, period: u32, index: usize) -> Result<Vec<f32>> {
        self.check_period(period)?;
        let index = self.check_element(kind, index)?;

        let offset = self.layout.row_offset(period, kind, index);
        self.reader
            .read_f32_row_at(offset, self.layout.vars(kind) as usize)
            .await
    }
}

/// Owns the file handle and serves absolute-offset reads.
#[derive(Debug)]
struct SectionReader {
    file: File,
}

impl SectionReader {
    fn new(file: File) -> Self {
        Self { file }
    }

    async fn read_at(&mut self, offset: u64, buffer: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::Start(offset)).await?;
        self.file.read_exact(buffer).await?;
        Ok(())
    }

    /// Fills `buffer` from the tail of the file.
    async fn read_at_end(&mut self, buffer: &mut [u8]) -> Result<()> {
        self.file.seek(SeekFrom::End(-(buffer.len() as i64))).await?;
        self.file.read_exact(buffer).await?;
        Ok(())
    }

    async fn read_u32_at(&mut self, offset: u64) -> Result<u32> {
        let mut buffer = [0u8; 4];
        self.read_at(offset, &mut buffer).await?;
        Ok((&buffer[..]).read_u32::<LittleEndian>().unwrap())
    }

    async fn read_i32_at(&mut self, offset: u64) -> Result<i32> {
        let mut buffer = [0u8; 4];
        self.read_at(offset, &mut buffer).await?;
        Ok((&buffer[..]).read_i32::<LittleEndian>().unwrap())
    }

    async fn read_f32_at(&mut self, offset: u64) -> Result<f32> {
        let mut buffer = [0u8; 4];
        self.read_at(offset, &mut buffer).await?;
        Ok((&buffer[..]).read_f32::<LittleEndian>().unwrap())
    }

    async fn read_f64_at(&mut self, offset: u64) -> Result<f64> {
        let mut buffer = [0u8; 8];
        self.read_at(offset, &mut buffer).await?;
        Ok((&buffer[..]).read_f64::<LittleEndian>().unwrap())
    }

    /// One bulk read of `length` contiguous little-endian floats.
    async fn read_f32_row_at(&mut self, offset: u64, length: usize) -> Result<Vec<f32>> {
        let mut bytes = vec![0u8; length * RECORD_SIZE as usize];
        self.read_at(offset, &mut bytes).await?;

        let mut values = vec![0f32; length];
        (&bytes[..])
            .read_f32_into::<LittleEndian>(&mut values)
            .unwrap();
        Ok(values)
    }
}
