//! stolas command-line front end.
//!
//! Compresses a raw little-endian f32 array into a `.stolas` archive, or
//! extracts an archive back into `<archive>.xout`.
//!
//! ```bash
//! # Compress a CESM field at a range-relative 1e-4 bound
//! stolas -z -i cldhgh.f32 --demo cesm -m r2r -e 1e-4
//!
//! # Extract it again
//! stolas -x -i cldhgh.f32.stolas
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use stolas::analysis::analyze_range;
use stolas::pipeline::{Compressor, Decompressor};
use stolas_core::{
    ArchiveHeader, CompressContext, DeviceBuffer, Dim3, EbMode, Error, Predictor, Result, Stream,
};

const LOG_INFO: &str = "  ::  ";
const LOG_FATAL: &str = "  !!  ";

#[derive(Parser, Debug)]
#[command(name = "stolas")]
#[command(version)]
#[command(about = "Error-bounded lossy compressor for dense scientific arrays", long_about = None)]
struct Args {
    /// Compress the input array
    #[arg(short = 'z', long, conflicts_with = "extract")]
    compress: bool,

    /// Extract an archive
    #[arg(short = 'x', long)]
    extract: bool,

    /// Input path: raw little-endian f32 array (-z) or archive (-x)
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Array extent as x[,y[,z]], e.g. 3600,1800
    #[arg(short = 'l', long)]
    len: Option<String>,

    /// Preset dataset shape (hacc, cesm, hurr, nyx, qmc, qmcpre, exafel,
    /// aramco, parihaka)
    #[arg(long, conflicts_with = "len")]
    demo: Option<String>,

    /// Bound mode: abs or r2r
    #[arg(short = 'm', long, default_value = "abs")]
    mode: String,

    /// Error bound
    #[arg(short = 'e', long, default_value_t = 1e-4)]
    eb: f64,

    /// Quantizer radius
    #[arg(short = 'r', long, default_value_t = 512)]
    radius: i32,

    /// Huffman chunk count; 0 derives one chunk per 32768 symbols
    #[arg(long, default_value_t = 0)]
    pardeg: i32,

    /// Predictor: lorenzo (spline3 is recognized but unsupported)
    #[arg(long, default_value = "lorenzo")]
    predictor: String,

    /// Starting Huffman word width in bytes, 4 or 8
    #[arg(long, default_value_t = 4)]
    huff_nbyte: i32,

    /// Inverse expected outlier sparsity
    #[arg(long, default_value_t = 4)]
    density_factor: i32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = args.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{LOG_FATAL}{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    if args.compress == args.extract {
        return Err(Error::config(
            "pass exactly one of -z (compress) or -x (extract)",
        ));
    }
    if args.compress {
        run_compress(args)
    } else {
        run_extract(args)
    }
}

fn run_compress(args: &Args) -> Result<()> {
    let dims = parse_dims(args)?;
    let data = read_f32_file(&args.input)?;
    if data.len() != dims.len() {
        return Err(Error::config(format!(
            "file holds {} samples, shape needs {}",
            data.len(),
            dims.len()
        )));
    }

    let mut ctx = CompressContext::new(dims, args.eb);
    ctx.mode = match args.mode.as_str() {
        "abs" => EbMode::Abs,
        "r2r" => EbMode::R2r,
        other => return Err(Error::config(format!("unknown mode '{other}'"))),
    };
    ctx.predictor = match args.predictor.as_str() {
        "lorenzo" => Predictor::Lorenzo,
        "spline3" => Predictor::Spline3,
        other => return Err(Error::config(format!("unknown predictor '{other}'"))),
    };
    ctx.radius = args.radius;
    ctx.pardeg = args.pardeg;
    ctx.huff_nbyte = args.huff_nbyte;
    ctx.nz_density_factor = args.density_factor;

    if ctx.mode == EbMode::R2r {
        let report = analyze_range(&data);
        ctx.eb = ctx.resolve_eb(report.range());
        println!(
            "{LOG_INFO}range [{}, {}], bound resolves to {:e}",
            report.min, report.max, ctx.eb
        );
    }

    let stream = Stream::default();
    let input = DeviceBuffer::from_host(&data);
    let mut compressor = Compressor::new(&ctx)?;
    let archive = compressor.compress(&input, stream)?;

    let out_path = suffixed(&args.input, ".stolas");
    fs::write(&out_path, archive)?;

    if let Some(stats) = compressor.stats() {
        println!(
            "{LOG_INFO}{} -> {} bytes ({:.2}x) at {}",
            stats.original_size,
            stats.compressed_size,
            stats.ratio(),
            out_path.display()
        );
    }
    Ok(())
}

fn run_extract(args: &Args) -> Result<()> {
    let archive = fs::read(&args.input)?;
    let header = ArchiveHeader::parse(&archive)?;
    let n = header.dims.len();

    let mut out = DeviceBuffer::<f32>::alloc(n);
    Decompressor::new().decompress(&archive, &mut out, Stream::default())?;

    let mut bytes = Vec::with_capacity(n * 4);
    for v in out.to_host() {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    let out_path = suffixed(&args.input, ".xout");
    fs::write(&out_path, &bytes)?;

    println!("{LOG_INFO}{n} samples at {}", out_path.display());
    Ok(())
}

fn parse_dims(args: &Args) -> Result<Dim3> {
    if let Some(name) = &args.demo {
        return demo_dims(name)
            .ok_or_else(|| Error::config(format!("unknown demo dataset '{name}'")));
    }
    let shape = args
        .len
        .as_ref()
        .ok_or_else(|| Error::config("shape required: pass -l x[,y[,z]] or --demo"))?;

    let mut extents = [1u32; 3];
    let parts: Vec<&str> = shape.split([',', 'x']).collect();
    if parts.is_empty() || parts.len() > 3 {
        return Err(Error::config(format!("cannot parse shape '{shape}'")));
    }
    for (slot, part) in extents.iter_mut().zip(&parts) {
        *slot = part
            .trim()
            .parse::<u32>()
            .map_err(|_| Error::config(format!("cannot parse shape '{shape}'")))?;
    }
    Ok(Dim3::d3(extents[0], extents[1], extents[2]))
}

/// Canonical shapes of the common demo datasets.
fn demo_dims(name: &str) -> Option<Dim3> {
    match name {
        "hacc" => Some(Dim3::d1(280_953_867)),
        "cesm" => Some(Dim3::d2(3600, 1800)),
        "hurr" => Some(Dim3::d3(500, 500, 100)),
        "nyx" => Some(Dim3::d3(512, 512, 512)),
        "qmc" => Some(Dim3::d3(288, 69, 7935)),
        "qmcpre" => Some(Dim3::d3(69, 69, 33120)),
        "exafel" => Some(Dim3::d2(388, 59200)),
        "aramco" => Some(Dim3::d3(235, 849, 849)),
        "parihaka" => Some(Dim3::d3(1168, 1126, 922)),
        _ => None,
    }
}

fn read_f32_file(path: &Path) -> Result<Vec<f32>> {
    let bytes = fs::read(path)?;
    if bytes.len() % 4 != 0 {
        return Err(Error::config(format!(
            "{} is {} bytes, not a whole number of f32 samples",
            path.display(),
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}
