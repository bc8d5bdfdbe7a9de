use std::time::Instant;
use std::{env, process};

use prairiedog::{utils, GraphBase, GraphStore, KeyValueBase, PathIndex, Value};

use getopts::Options;

//-----------------------------------------------------------------------------

fn main() -> Result<(), String> {
    let start_time = Instant::now();

    // Parse arguments.
    let config = Config::new()?;
    if !utils::file_exists(&config.db_file) {
        return Err(format!("Database {} does not exist", config.db_file));
    }

    let mut graph = GraphBase::open(&config.db_file)?;
    let mut paths = KeyValueBase::open(&config.db_file)?;
    if config.verbose {
        eprintln!(
            "Opened {} with {} nodes, {} edges, and {} keys",
            config.db_file, graph.nodes()?, graph.edges()?, paths.keys()?.len()
        );
    }

    if let Some(kmer) = &config.kmer {
        query_kmer(&mut graph, kmer)?;
    }
    if let Some(header) = &config.path {
        query_path(&mut graph, &mut paths, header)?;
    }
    if let Some(key) = &config.key {
        match paths.get(key)? {
            Some(value) => println!("{}\t{}", key, value),
            None => println!("{}\tnot found", key),
        }
    }

    if config.verbose {
        let seconds = start_time.elapsed().as_secs_f64();
        eprintln!("Used {:.3} seconds", seconds);
    }

    Ok(())
}

//-----------------------------------------------------------------------------

// Prints the node with the k-mer sequence and its successors.
fn query_kmer(graph: &mut GraphBase, kmer: &str) -> Result<(), String> {
    let Some(id) = graph.query(kmer.as_bytes())? else {
        println!("{}\tnot found", kmer);
        return Ok(());
    };
    let successors = graph.successors(id)?;
    let mut line = format!("{}\t{}", kmer, id);
    for successor in successors {
        let node = graph.get_node(successor)?.ok_or(format!("Missing node {}", successor))?;
        line.push_str(&format!("\t{}:{}", node.id, String::from_utf8_lossy(&node.sequence)));
    }
    println!("{}", line);
    Ok(())
}

// Prints the path for the header and the k-mers it visits.
fn query_path(graph: &mut GraphBase, paths: &mut KeyValueBase, header: &str) -> Result<(), String> {
    let nodes = match paths.get(header)? {
        Some(Value::Path(nodes)) => nodes,
        Some(value) => return Err(format!("Key {} is not a path: {}", header, value)),
        None => {
            println!("{}\tnot found", header);
            return Ok(());
        }
    };
    println!("{}\t{}", header, Value::Path(nodes.clone()));
    for id in nodes {
        let node = graph.get_node(id)?.ok_or(format!("Missing node {}", id))?;
        println!("{}\t{}", node.id, String::from_utf8_lossy(&node.sequence));
    }
    Ok(())
}

//-----------------------------------------------------------------------------

struct Config {
    pub db_file: String,
    pub kmer: Option<String>,
    pub path: Option<String>,
    pub key: Option<String>,
    pub verbose: bool,
}

impl Config {
    pub fn new() -> Result<Config, String> {
        let args: Vec<String> = env::args().collect();
        let program = args[0].clone();
        let header = format!("Usage: {} [options] graph.db", program);

        let mut opts = Options::new();
        opts.optflag("h", "help", "print this help");
        opts.optopt("", "kmer", "find the node for this k-mer and its successors", "SEQ");
        opts.optopt("", "path", "print the path for this contig header", "HEADER");
        opts.optopt("", "key", "print the value for this key", "KEY");
        opts.optflag("v", "verbose", "print database statistics");
        let matches = opts.parse(&args[1..]).map_err(|x| x.to_string())?;

        if matches.opt_present("h") {
            eprint!("{}", opts.usage(&header));
            process::exit(0);
        }
        let db_file = if let Some(s) = matches.free.first() {
            s.clone()
        } else {
            eprint!("{}", opts.usage(&header));
            process::exit(1);
        };

        let kmer = matches.opt_str("kmer");
        let path = matches.opt_str("path");
        let key = matches.opt_str("key");
        if kmer.is_none() && path.is_none() && key.is_none() {
            return Err(String::from("One of --kmer, --path, or --key must be specified"));
        }

        Ok(Config {
            db_file,
            kmer,
            path,
            key,
            verbose: matches.opt_present("v"),
        })
    }
}

//-----------------------------------------------------------------------------
