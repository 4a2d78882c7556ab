#[macro_use]
extern crate prettytable;

use oxidized_swmm::datetime::{self, DateFormat};
use oxidized_swmm::{LinkAttribute, SwmmOutput};
use prettytable::Table;
use structopt::StructOpt;

/// Prints the flow rate series of one link of a SWMM binary output file.
#[derive(StructOpt)]
struct Opt {
    /// Path of the binary output file
    file: String,

    /// Zero based index of the link to report
    #[structopt(short, long, default_value = "0")]
    link: usize,
}

#[async_std::main]
async fn main() {
    femme::with_level(log::LevelFilter::Debug);

    let opt = Opt::from_args();

    let mut output = SwmmOutput::open(&opt.file).await.unwrap();
    let name = output
        .element_name(oxidized_swmm::ElementKind::Link, opt.link)
        .await
        .unwrap()
        .to_string();

    println!("--------------------");
    println!("Flow rate of link: {}", name);
    println!("--------------------");

    let n_periods = output.n_periods();
    let series = output
        .link_series(opt.link, LinkAttribute::FlowRate, 0, n_periods)
        .await
        .unwrap();

    let mut pretty_table = Table::new();
    pretty_table.add_row(row!["period", "date", "time", "flow rate"]);

    for (period, value) in series.iter().enumerate() {
        let date = output.period_date(period as u32).await.unwrap();
        pretty_table.add_row(row![
            period,
            datetime::date_to_string(date, DateFormat::YearMonthDay),
            datetime::time_to_string(date),
            value
        ]);
    }

    pretty_table.printstd();
}
