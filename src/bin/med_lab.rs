//! 医学检验室仿真
//!
//! 接待处（一名秘书）+ 检查室（若干护士），重复模拟若干个工作日

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use edsim_rs::engine::{
    Engine, EngineConfig, ProgressListener, RunEnded, Terminated, TracingListener, UnitHandle,
};
use edsim_rs::models::{
    Admission, AdmissionParams, DayStats, Examination, ExaminationParams, LabDay, OfficeAction,
};
use parking_lot::Mutex;

#[derive(Debug, Parser)]
#[command(name = "med-lab", about = "医学检验室仿真：接待 + 检查两级排队")]
struct Args {
    /// 护士（检查室）数量
    #[arg(long, default_value_t = 2)]
    nurses: u32,
    /// 模拟天数（运行次数）；默认 5，或取配置文件中的值
    #[arg(long)]
    runs: Option<u32>,
    /// 随机种子；接待处用 seed，检查室用 seed+1
    #[arg(long)]
    seed: Option<u64>,
    /// 引擎配置 JSON
    #[arg(long)]
    config: Option<PathBuf>,
    /// 每行输出一个 JSON 对象
    #[arg(long)]
    json: bool,
}

struct LabPrinter {
    admission: UnitHandle<Admission>,
    exam: UnitHandle<Examination>,
    stats: Arc<Mutex<DayStats>>,
    json: bool,
}

impl ProgressListener for LabPrinter {
    fn on_run_ended(&mut self, r: &RunEnded) {
        let day = LabDay::collect(&self.admission.lock(), &self.exam.lock(), r.last_event_time);
        if self.json {
            let line = serde_json::json!({ "kind": "day", "run": r.run, "report": day });
            println!("{line}");
        } else {
            println!("{}", r.message);
            println!(
                "day run={} admitted={} examined={} admitted_after_closing={} overtime_min={:.1}",
                r.run,
                day.admitted,
                day.examined,
                day.admitted_after_closing,
                day.overtime / 60.0
            );
            for (n, share) in day.nurse_busy_share.iter().enumerate() {
                println!("  busy[{n}]={:.2}%", share * 100.0);
            }
        }
        self.stats.lock().push(&day);
    }

    fn on_terminated(&mut self, t: &Terminated) {
        if !self.json {
            println!("{}", t.message);
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let admission_params = AdmissionParams::default();
    let mut cfg = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig {
            end_time: admission_params.opening,
            runs: 5,
            ..EngineConfig::default()
        },
    };
    if let Some(r) = args.runs {
        cfg.runs = r;
    }

    let engine: Engine<OfficeAction> = Engine::with_config(cfg);
    let exam = engine.add_unit(Examination::new(
        ExaminationParams {
            nurses: args.nurses,
            ..ExaminationParams::default()
        },
        args.seed.map(|s| s.wrapping_add(1)),
    )?);
    let admission = engine.add_unit(Admission::new(admission_params, exam.id(), args.seed)?);

    let stats = Arc::new(Mutex::new(DayStats::default()));
    // 步进进度只写日志
    engine.add_listener(TracingListener);
    engine.add_listener(LabPrinter {
        admission,
        exam,
        stats: Arc::clone(&stats),
        json: args.json,
    });

    engine.start()?;
    engine.wait()?;

    let summary = stats.lock().summary();
    if args.json {
        let line = serde_json::json!({ "kind": "summary", "summary": summary });
        println!("{line}");
    } else {
        for (name, mean) in &summary.means {
            println!("mean {name}={mean:.2}");
        }
        for (n, share) in summary.busy_share.iter().enumerate() {
            println!("mean busy[{n}]={:.2}%", share * 100.0);
        }
        println!("duration={:?}", engine.duration());
    }
    Ok(())
}

fn main() -> ExitCode {
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
            eprintln!("med-lab: {e}");
            ExitCode::FAILURE
        }
    }
}
