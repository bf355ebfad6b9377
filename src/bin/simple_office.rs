//! 办公室排队仿真
//!
//! 重复模拟若干个工作日，输出每天的服务人数和多日均值

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use edsim_rs::engine::{
    Engine, EngineConfig, Notification, ProgressListener, RunEnded, StepProgress, Terminated,
    UnitHandle,
};
use edsim_rs::models::{DayStats, Office, OfficeAction, OfficeParams};
use edsim_rs::sim::SimTime;
use parking_lot::Mutex;

#[derive(Debug, Parser)]
#[command(name = "simple-office", about = "办公室排队仿真：FIFO 队列 + 若干服务台")]
struct Args {
    /// 服务台数量
    #[arg(long, default_value_t = 1)]
    desks: u32,
    /// 模拟天数（运行次数）；默认 2，或取配置文件中的值
    #[arg(long)]
    runs: Option<u32>,
    /// 随机种子；不指定则每次结果不同
    #[arg(long)]
    seed: Option<u64>,
    /// 开放时长（小时）
    #[arg(long)]
    opening_hours: Option<f64>,
    /// 引擎配置 JSON（begin_time/end_time/stop_at_end_time/runs）
    #[arg(long)]
    config: Option<PathBuf>,
    /// 每行输出一个 JSON 对象
    #[arg(long)]
    json: bool,
}

struct DayPrinter {
    office: UnitHandle<Office>,
    stats: Arc<Mutex<DayStats>>,
    json: bool,
}

impl ProgressListener for DayPrinter {
    fn on_step(&mut self, p: &StepProgress) {
        if self.json {
            println!("{}", to_json(&Notification::Step(p.clone())));
        } else {
            println!("{}: {}%", p.message, p.percent.min(100));
        }
    }

    fn on_run_ended(&mut self, r: &RunEnded) {
        let day = self.office.lock().day_report(r.last_event_time);
        if self.json {
            let line = serde_json::json!({ "kind": "day", "run": r.run, "report": day });
            println!("{line}");
        } else {
            println!("{}", r.message);
            println!(
                "day run={} arrivals={} served={} served_after_closing={} last_event_time={}",
                r.run, day.arrivals, day.served, day.served_after_closing, r.last_event_time
            );
        }
        self.stats.lock().push(&day);
    }

    fn on_terminated(&mut self, t: &Terminated) {
        if self.json {
            println!("{}", to_json(&Notification::Terminated(t.clone())));
        } else {
            println!("{}", t.message);
        }
    }
}

fn to_json<T: serde::Serialize>(v: &T) -> String {
    serde_json::to_string(v).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut params = if args.desks > 1 {
        OfficeParams::two_desk_default()
    } else {
        OfficeParams::default()
    };
    params.desks = args.desks;
    if let Some(h) = args.opening_hours {
        params.opening = SimTime::from_hours(h);
    }

    let mut cfg = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig {
            end_time: params.opening,
            runs: 2,
            ..EngineConfig::default()
        },
    };
    if let Some(r) = args.runs {
        cfg.runs = r;
    }

    let engine: Engine<OfficeAction> = Engine::with_config(cfg);
    let office = engine.add_unit(Office::new("office", params, args.seed)?);
    let stats = Arc::new(Mutex::new(DayStats::default()));
    engine.add_listener(DayPrinter {
        office,
        stats: Arc::clone(&stats),
        json: args.json,
    });

    engine.start()?;
    engine.wait()?;

    let stats = stats.lock();
    if args.json {
        let line = serde_json::json!({ "kind": "summary", "summary": stats.summary() });
        println!("{line}");
    } else {
        let summary = stats.summary();
        for (name, mean) in &summary.means {
            println!("mean {name}={mean:.2}");
        }
        for (n, share) in summary.busy_share.iter().enumerate() {
            println!("mean busy_share[{n}]={:.2}%", share * 100.0);
        }
        println!("duration={:?}", engine.duration());
    }
    Ok(())
}

fn main() -> ExitCode {
    // 初始化 tracing（写到 stderr，stdout 留给结果）
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("simple-office: {e}");
            ExitCode::FAILURE
        }
    }
}
