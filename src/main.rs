use std::path::Path;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use filter_query::token::Span;
use filter_query::{BuilderConfig, Query, QueryBuilder};

const CONFIG_FILE: &str = "filter_query.json";

const HELP: &str = "\
Enter a filter, e.g. age > 20 AND (name LIKE 'pippo' OR id IN (1,2,3))
  :tree   toggle the debug tree output
  :json   toggle the JSON output
  :help   show this message
  :quit   exit";

/// 从工作目录加载 `filter_query.json`，失败时使用默认配置
fn load_config() -> BuilderConfig {
    if !Path::new(CONFIG_FILE).exists() {
        return BuilderConfig::default();
    }
    match BuilderConfig::from_json_file(CONFIG_FILE) {
        Ok(config) => {
            tracing::info!(?config, "loaded {CONFIG_FILE}");
            config
        }
        Err(e) => {
            tracing::warn!(error = %e, "cannot load {CONFIG_FILE}, using defaults");
            BuilderConfig::default()
        }
    }
}

#[derive(Debug, Default)]
struct Output {
    tree: bool,
    json: bool,
}

/// 在出错位置下方画出 `^`，列按字符计算，不是按字节
fn caret_line(filter: &str, span: Span) -> String {
    let column = filter.get(..span.start).map_or(0, |prefix| prefix.chars().count());
    let width = filter
        .get(span.start..span.end)
        .map_or(1, |text| text.chars().count().max(1));
    format!("{}{}", " ".repeat(column), "^".repeat(width))
}

fn report(builder: &QueryBuilder, filter: &str, output: &Output) -> Result<()> {
    match builder.create_query_filter(filter) {
        Ok(Some(query)) => print_query(&query, output)?,
        Ok(None) => println!("(no filter)"),
        Err(e) => {
            println!("✗ {e}");
            if let Some(span) = e.span() {
                println!("  {filter}");
                println!("  {}", caret_line(filter, span));
            }
        }
    }
    Ok(())
}

fn print_query(query: &Query, output: &Output) -> Result<()> {
    println!("{}", query.definition());
    if output.tree {
        println!("{query:#?}");
    }
    if output.json {
        let json = serde_json::to_string_pretty(query).context("serializing query")?;
        println!("{json}");
    }
    Ok(())
}

fn repl(builder: &QueryBuilder) -> Result<()> {
    let mut editor = DefaultEditor::new().context("starting line editor")?;
    let mut output = Output::default();
    println!("{HELP}");

    loop {
        let line = match editor.readline("filter> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("reading input"),
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        editor.add_history_entry(line)?;

        match line {
            ":quit" | ":q" => break,
            ":help" => println!("{HELP}"),
            ":tree" => {
                output.tree = !output.tree;
                println!("tree output {}", if output.tree { "on" } else { "off" });
            }
            ":json" => {
                output.json = !output.json;
                println!("json output {}", if output.json { "on" } else { "off" });
            }
            filter => report(builder, filter, &output)?,
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let builder = QueryBuilder::with_config(load_config());

    // 命令行参数中的过滤器直接解析，不进入交互模式
    let filters: Vec<String> = std::env::args().skip(1).collect();
    if filters.is_empty() {
        return repl(&builder);
    }
    let output = Output::default();
    for filter in &filters {
        report(&builder, filter, &output)?;
    }
    Ok(())
}
