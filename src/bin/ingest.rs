use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::time::Instant;
use std::{env, process};

use prairiedog::{db, utils};
use prairiedog::{ingest_file, AssemblyParams, Cancellation, IngestConfig, NodePolicy};
use prairiedog::{GraphBase, KeyValueBase, KmerStream, PathIndex, Value};

use getopts::Options;
use log::{info, LevelFilter};

//-----------------------------------------------------------------------------

// Keys for run metadata in the path index.
const KEY_K: &str = "_meta_k";
const KEY_NODE_POLICY: &str = "_meta_node_policy";
const KEY_FILES: &str = "_meta_files";

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new()?;
    init_log(&config)?;

    // Check if the database already exists.
    if utils::file_exists(&config.db_file) {
        if config.overwrite {
            info!("Overwriting database {}", config.db_file);
            fs::remove_file(&config.db_file).map_err(|x| x.to_string())?;
        } else {
            return Err(format!("Database {} already exists", config.db_file));
        }
    }

    // Find the input files.
    let mut files: Vec<PathBuf> = Vec::new();
    for input in config.inputs.iter() {
        let found = utils::walk_files(input).map_err(|x| format!("Cannot read {}: {}", input, x))?;
        files.extend(found);
    }
    if files.is_empty() {
        return Err(String::from("No input files found"));
    }

    // Create the database.
    db::create(&config.db_file)?;
    let mut graph = GraphBase::open(&config.db_file)?;
    let mut paths = KeyValueBase::open(&config.db_file)?;
    paths.set(KEY_K, &Value::Int(config.params.k as i64))?;
    paths.set(KEY_NODE_POLICY, &Value::from(config.params.node_policy.name()))?;

    // Ingest the files one at a time.
    let cancellation = Cancellation::new();
    for (i, file) in files.iter().enumerate() {
        let ingest_config = IngestConfig {
            input: file.clone(),
            params: config.params.clone(),
        };
        ingest_file(&ingest_config, &mut graph, &mut paths, &cancellation).map_err(|x| x.to_string())?;
        paths.set(KEY_FILES, &Value::Int(i as i64 + 1))?;
    }

    // Statistics.
    info!(
        "The graph contains {} nodes and {} edges from {} files",
        graph.nodes()?, graph.edges()?, files.len()
    );
    info!("Database size: {}", graph.file_size().unwrap_or(String::from("unknown")));

    let end_time = Instant::now();
    let seconds = end_time.duration_since(start_time).as_secs_f64();
    info!("Used {:.3} seconds", seconds);

    Ok(())
}

//-----------------------------------------------------------------------------

// Logs go to stderr or to the file given with `--log`.
fn init_log(config: &Config) -> Result<(), String> {
    let level = if config.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level).format_timestamp(None).format_target(false);
    if let Some(filename) = &config.log_file {
        let file = OpenOptions::new().create(true).append(true).open(filename).map_err(
            |x| format!("Cannot open log file {}: {}", filename, x)
        )?;
        builder.format_timestamp_secs().target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub inputs: Vec<String>,
    pub db_file: String,
    pub params: AssemblyParams,
    pub log_file: Option<String>,
    pub overwrite: bool,
    pub verbose: bool,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!("Usage: {} [options] input1 [input2 ...]", program);

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("o", "output", "database file (default: <input1>.db)", "FILE");
        opts.optopt("k", "", &format!("k-mer length (default: {})", KmerStream::DEFAULT_K), "INT");
        opts.optopt("", "nodes", "node policy: per-edge (default), per-occurrence, or distinct", "STR");
        opts.optopt("", "log", "write the log to this file", "FILE");
        opts.optflag("", "overwrite", "overwrite the database file if it exists");
        opts.optflag("v", "verbose", "print progress information for each contig");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        if matches.free.is_empty() {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        }
        let inputs = matches.free.clone();

        let db_file = matches.opt_str("o").unwrap_or_else(|| format!("{}.db", inputs[0]));
        let mut params = AssemblyParams::default();
        if let Some(s) = matches.opt_str("k") {
            params.k = s.parse::<usize>().map_err(|x| format!("-k: {}", x))?;
            if params.k == 0 {
                return Err(String::from("-k: k-mer length must be positive"));
            }
        }
        if let Some(s) = matches.opt_str("nodes") {
            params.node_policy = s.parse::<NodePolicy>().map_err(|x| format!("--nodes: {}", x))?;
        }

        Ok(Config {
            inputs,
            db_file,
            params,
            log_file: matches.opt_str("log"),
            overwrite: matches.opt_present("overwrite"),
            verbose: matches.opt_present("v"),
        })
    }
}

//-----------------------------------------------------------------------------
