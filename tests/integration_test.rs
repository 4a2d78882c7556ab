use byteorder::{LittleEndian, WriteBytesExt};
use oxidized_swmm::{
    datetime, ElementCount, ElementKind, Error, LinkAttribute, NodeAttribute, SubcatchAttribute,
    SwmmOutput, SystemAttribute,
};
use pretty_assertions::assert_eq;
use rstest::rstest;
use std::io::Write;
use tempfile::NamedTempFile;

const MAGIC: u32 = 516114522;

const N_SUBCATCH: u32 = 7;
const N_NODES: u32 = 14;
const N_LINKS: u32 = 16;
const N_PERIODS: u32 = 4;
const REPORT_STEP: i32 = 60;

const SUBCATCH_VARS: u32 = 8;
const NODE_VARS: u32 = 6;
const LINK_VARS: u32 = 5;
const SYSTEM_VARS: u32 = 14;

const POLLUTANT_NAMES: [&str; 2] = ["TSS", "Lead"];

fn start_date() -> f64 {
    datetime::encode_date(2024, 2, 29) + datetime::encode_time(8, 0, 0)
}

fn period_timestamp(period: u32) -> f64 {
    start_date() + f64::from(period + 1) * f64::from(REPORT_STEP) / 86400.0
}

/// Every scalar in the golden file is a function of its coordinates, so
/// any query shape can predict what it must read.
fn sample_value(kind: ElementKind, index: usize, ordinal: usize, period: u32) -> f32 {
    (kind as usize * 1_000_000 + index * 10_000 + ordinal * 100 + period as usize) as f32
}

struct GoldenFile {
    n_pollut: u32,
    n_periods: u32,
    error_code: i32,
    trailing_magic: u32,
}

impl Default for GoldenFile {
    fn default() -> Self {
        Self {
            n_pollut: 0,
            n_periods: N_PERIODS,
            error_code: 0,
            trailing_magic: MAGIC,
        }
    }
}

impl GoldenFile {
    fn with_pollutants() -> Self {
        Self {
            n_pollut: POLLUTANT_NAMES.len() as u32,
            ..Self::default()
        }
    }

    /// Writes a complete output file: leader, header, ID table with
    /// concentration unit codes, input properties, variable code lists,
    /// start date and report step, the period blocks, and the epilogue.
    fn build(&self) -> NamedTempFile {
        let mut buf = Vec::new();

        buf.write_u32::<LittleEndian>(MAGIC).unwrap();
        buf.write_i32::<LittleEndian>(51000).unwrap();
        buf.write_i32::<LittleEndian>(1).unwrap(); // flow units
        buf.write_u32::<LittleEndian>(N_SUBCATCH).unwrap();
        buf.write_u32::<LittleEndian>(N_NODES).unwrap();
        buf.write_u32::<LittleEndian>(N_LINKS).unwrap();
        buf.write_u32::<LittleEndian>(self.n_pollut).unwrap();

        let id_pos = buf.len() as u32;
        for name in element_names(self.n_pollut) {
            buf.write_u32::<LittleEndian>(name.len() as u32).unwrap();
            buf.write_all(name.as_bytes()).unwrap();
        }
        for _ in 0..self.n_pollut {
            // concentration unit code, mg/L
            buf.write_u32::<LittleEndian>(0).unwrap();
        }

        let obj_prop_pos = buf.len() as u32;
        let property_records = (N_SUBCATCH + 2) + (3 * N_NODES + 4) + (5 * N_LINKS + 6);
        for _ in 0..property_records {
            buf.write_i32::<LittleEndian>(0).unwrap();
        }

        for &fixed in &[SUBCATCH_VARS, NODE_VARS, LINK_VARS] {
            let vars = fixed + self.n_pollut;
            buf.write_u32::<LittleEndian>(vars).unwrap();
            for code in 0..vars {
                buf.write_u32::<LittleEndian>(code).unwrap();
            }
        }
        buf.write_u32::<LittleEndian>(SYSTEM_VARS).unwrap();
        for code in 0..SYSTEM_VARS {
            buf.write_u32::<LittleEndian>(code).unwrap();
        }

        buf.write_f64::<LittleEndian>(start_date()).unwrap();
        buf.write_i32::<LittleEndian>(REPORT_STEP).unwrap();

        let results_pos = buf.len() as u32;
        let counts = [N_SUBCATCH, N_NODES, N_LINKS, 1];
        let kinds = [
            ElementKind::Subcatch,
            ElementKind::Node,
            ElementKind::Link,
            ElementKind::System,
        ];
        for period in 0..self.n_periods {
            buf.write_f64::<LittleEndian>(period_timestamp(period)).unwrap();
            for (&kind, &count) in kinds.iter().zip(counts.iter()) {
                let vars = self.vars(kind);
                for index in 0..count as usize {
                    for ordinal in 0..vars as usize {
                        buf.write_f32::<LittleEndian>(sample_value(kind, index, ordinal, period))
                            .unwrap();
                    }
                }
            }
        }

        buf.write_u32::<LittleEndian>(id_pos).unwrap();
        buf.write_u32::<LittleEndian>(obj_prop_pos).unwrap();
        buf.write_u32::<LittleEndian>(results_pos).unwrap();
        buf.write_u32::<LittleEndian>(self.n_periods).unwrap();
        buf.write_i32::<LittleEndian>(self.error_code).unwrap();
        buf.write_u32::<LittleEndian>(self.trailing_magic).unwrap();

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(&buf).unwrap();
        file.flush().unwrap();
        file
    }

    fn vars(&self, kind: ElementKind) -> u32 {
        match kind {
            ElementKind::Subcatch => SUBCATCH_VARS + self.n_pollut,
            ElementKind::Node => NODE_VARS + self.n_pollut,
            ElementKind::Link => LINK_VARS + self.n_pollut,
            ElementKind::System => SYSTEM_VARS,
        }
    }
}

fn element_names(n_pollut: u32) -> Vec<String> {
    let mut names = Vec::new();
    names.extend((1..=N_SUBCATCH).map(|n| format!("SC{:02}", n)));
    names.extend((1..=N_NODES).map(|n| format!("J{:02}", n)));
    names.extend((1..=N_LINKS).map(|n| format!("C{:02}", n)));
    names.extend(
        POLLUTANT_NAMES
            .iter()
            .take(n_pollut as usize)
            .map(|name| (*name).to_string()),
    );
    names
}

async fn open(file: &NamedTempFile) -> Result<SwmmOutput, Error> {
    SwmmOutput::open(file.path().to_str().unwrap()).await
}

#[rstest(
    count,
    expected,
    case(ElementCount::Subcatchments, 7),
    case(ElementCount::Nodes, 14),
    case(ElementCount::Links, 16),
    case(ElementCount::Pollutants, 0)
)]
#[async_std::test]
async fn project_size(count: ElementCount, expected: usize) -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let output = open(&file).await?;
    assert_eq!(output.project_size(count), expected);
    Ok(())
}

#[async_std::test]
async fn header_values() -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let output = open(&file).await?;

    assert_eq!(output.version(), 51000);
    assert_eq!(output.flow_units(), 1);
    assert_eq!(output.report_step(), 60);
    assert_eq!(output.n_periods(), N_PERIODS);

    let start = output.start_date();
    assert_eq!(datetime::decode_date(start), (2024, 2, 29));
    assert_eq!(datetime::decode_time(start), (8, 0, 0));
    Ok(())
}

#[async_std::test]
async fn link_series_matches_per_period_attributes() -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;

    let series = output
        .link_series(0, LinkAttribute::FlowRate, 0, N_PERIODS)
        .await?;
    assert_eq!(series.len(), N_PERIODS as usize);

    for period in 0..N_PERIODS {
        let snapshot = output.link_attribute(period, LinkAttribute::FlowRate).await?;
        assert_eq!(snapshot.len(), N_LINKS as usize);
        assert_eq!(series[period as usize], snapshot[0]);
    }
    Ok(())
}

#[async_std::test]
async fn link_result_holds_all_five_columns() -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;

    let row = output.link_result(1, 0).await?;
    assert_eq!(row.len(), 5);
    assert_eq!(row[4], sample_value(ElementKind::Link, 0, 4, 1));

    let capacity = output.link_series(0, LinkAttribute::Capacity, 1, 2).await?;
    assert_eq!(row[4], capacity[0]);
    Ok(())
}

#[async_std::test]
async fn series_attribute_and_result_agree() -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;

    let period = 2;
    let node = 5;
    let attribute = NodeAttribute::TotalInflow;

    let from_series = output.node_series(node, attribute, period, period + 1).await?[0];
    let from_attribute = output.node_attribute(period, attribute).await?[node];
    let from_row = output.node_result(period, node).await?[attribute.index()];

    assert_eq!(from_series, from_attribute);
    assert_eq!(from_attribute, from_row);
    assert_eq!(from_row, sample_value(ElementKind::Node, node, attribute.index(), period));
    Ok(())
}

#[async_std::test]
async fn query_order_does_not_change_results() -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;

    let first = output
        .subcatch_series(3, SubcatchAttribute::RunoffRate, 1, 2)
        .await?;
    let _ = output.system_result(3).await?;
    let _ = output.node_attribute(0, NodeAttribute::InvertDepth).await?;
    let second = output
        .subcatch_series(3, SubcatchAttribute::RunoffRate, 1, 2)
        .await?;

    assert_eq!(first, second);
    Ok(())
}

#[async_std::test]
async fn system_queries_cover_the_singleton() -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;

    let row = output.system_result(0).await?;
    assert_eq!(row.len(), SYSTEM_VARS as usize);

    let scalar = output.system_attribute(0, SystemAttribute::EvapRate).await?;
    assert_eq!(scalar, row[SystemAttribute::EvapRate.index()]);

    let series = output
        .system_series(SystemAttribute::AirTemp, 0, N_PERIODS)
        .await?;
    assert_eq!(series[0], row[0]);
    Ok(())
}

#[rstest(
    kind,
    index,
    expected,
    case(ElementKind::Subcatch, 0, "SC01"),
    case(ElementKind::Subcatch, 6, "SC07"),
    case(ElementKind::Node, 13, "J14"),
    case(ElementKind::Link, 15, "C16")
)]
#[async_std::test]
async fn element_names_round_trip(kind: ElementKind, index: usize, expected: &str) -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;
    assert_eq!(output.element_name(kind, index).await?, expected);
    Ok(())
}

#[async_std::test]
async fn pollutant_names_live_in_the_system_population() -> Result<(), Error> {
    let file = GoldenFile::with_pollutants().build();
    let mut output = open(&file).await?;

    assert_eq!(output.project_size(ElementCount::Pollutants), 2);
    assert_eq!(output.element_name(ElementKind::System, 0).await?, "TSS");
    assert_eq!(output.element_name(ElementKind::System, 1).await?, "Lead");
    Ok(())
}

#[async_std::test]
async fn system_names_are_out_of_range_without_pollutants() -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;

    let err = output.element_name(ElementKind::System, 0).await.unwrap_err();
    assert_eq!(err.code(), 423);
    Ok(())
}

#[async_std::test]
async fn pollutant_columns_follow_the_fixed_ones() -> Result<(), Error> {
    let file = GoldenFile::with_pollutants().build();
    let mut output = open(&file).await?;

    let series = output
        .subcatch_series(2, SubcatchAttribute::PollutantConc(1), 0, 1)
        .await?;
    assert_eq!(series[0], sample_value(ElementKind::Subcatch, 2, 9, 0));

    let row = output.link_result(0, 0).await?;
    assert_eq!(row.len(), 7);

    let err = output
        .link_series(0, LinkAttribute::PollutantConc(2), 0, 1)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 423);
    Ok(())
}

#[async_std::test]
async fn period_dates_follow_the_report_step() -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;

    for period in 0..N_PERIODS {
        assert_eq!(output.period_date(period).await?, period_timestamp(period));
    }
    assert_eq!(output.period_date(N_PERIODS).await.unwrap_err().code(), 423);
    Ok(())
}

#[async_std::test]
async fn series_end_is_an_exclusive_index_not_a_length() -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;

    // a window reaching past the last period is rejected, not clamped
    let err = output
        .link_series(0, LinkAttribute::FlowRate, 2, 100)
        .await
        .unwrap_err();
    assert_eq!(err.code(), 423);

    let window = output.link_series(0, LinkAttribute::FlowRate, 0, 2).await?;
    assert_eq!(window.len(), 2);

    let empty = output.link_series(0, LinkAttribute::FlowRate, 2, 2).await?;
    assert!(empty.is_empty());
    Ok(())
}

#[rstest(
    kind,
    index,
    case(ElementKind::Subcatch, 7),
    case(ElementKind::Node, 14),
    case(ElementKind::Link, 16)
)]
#[async_std::test]
async fn entity_indices_are_validated(kind: ElementKind, index: usize) -> Result<(), Error> {
    let file = GoldenFile::default().build();
    let mut output = open(&file).await?;
    let err = output.element_name(kind, index).await.unwrap_err();
    assert_eq!(err.code(), 423);
    Ok(())
}

#[async_std::test]
async fn mismatched_magic_is_rejected() {
    let file = GoldenFile {
        trailing_magic: MAGIC + 1,
        ..GoldenFile::default()
    }
    .build();

    let err = open(&file).await.unwrap_err();
    assert_eq!(err.code(), 435);
}

#[async_std::test]
async fn terminated_run_is_rejected() {
    let file = GoldenFile {
        error_code: 317,
        ..GoldenFile::default()
    }
    .build();

    let err = open(&file).await.unwrap_err();
    assert_eq!(err.code(), 435);
}

#[async_std::test]
async fn file_without_periods_is_rejected() {
    let file = GoldenFile {
        n_periods: 0,
        ..GoldenFile::default()
    }
    .build();

    let err = open(&file).await.unwrap_err();
    assert_eq!(err.code(), 436);
}

#[async_std::test]
async fn missing_file_is_unopenable() {
    let err = SwmmOutput::open("data/does-not-exist.out").await.unwrap_err();
    assert_eq!(err.code(), 434);
}

#[test]
fn magic_handshake_and_section_bounds() {
    let file = GoldenFile::default().build();
    let bytes = std::fs::read(file.path()).unwrap();

    // the four leading bytes equal the four trailing bytes
    assert_eq!(&bytes[..4], &bytes[bytes.len() - 4..]);

    let results_pos = u32::from_le_bytes([
        bytes[bytes.len() - 16],
        bytes[bytes.len() - 15],
        bytes[bytes.len() - 14],
        bytes[bytes.len() - 13],
    ]) as usize;
    let bytes_per_period = 8
        + 4 * (N_SUBCATCH * SUBCATCH_VARS
            + N_NODES * NODE_VARS
            + N_LINKS * LINK_VARS
            + SYSTEM_VARS) as usize;
    assert!(bytes.len() >= results_pos + N_PERIODS as usize * bytes_per_period + 24);
}
