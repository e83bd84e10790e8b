use clap::{Args, Parser as ClapParser, Subcommand};
use cohql::{
    cli::{self, CheckOptions, CheckResult, CliError},
    unparse,
};
use std::io::{self, Read};

#[derive(ClapParser)]
#[command(name = "cohql")]
#[command(about = "cohql - parse, compile and run CohQL filters and statements")]
#[command(version)]
struct Cli {
    /// Log compiled filters and statements (-vv for parser tracing)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct LanguageArgs {
    /// Treat the query as `;`-separated SQL statements
    #[arg(long)]
    sql: bool,

    /// Enable `[...]`, `{...}` and `k: v` literals
    #[arg(long)]
    extended: bool,

    /// Reject unknown operator symbols instead of reading them as identifiers
    #[arg(long)]
    strict: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate and execute a filter or statements
    Check {
        /// The filter, or statements with --sql
        query: String,

        #[command(flatten)]
        language: LanguageArgs,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Positional bind variables as a JSON array
        #[arg(long)]
        bind: Option<String>,

        /// Named bind variables as a JSON object
        #[arg(long)]
        named: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,

        /// Only validate syntax, don't execute
        #[arg(long)]
        syntax_only: bool,
    },

    /// Print the parsed term tree
    Parse {
        /// The filter, or statements with --sql
        query: String,

        #[command(flatten)]
        language: LanguageArgs,

        /// Print re-rendered query text instead of term notation
        #[arg(long)]
        unparse: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let result = match cli.command {
        Commands::Check {
            query,
            language,
            input,
            bind,
            named,
            pretty,
            syntax_only,
        } => run_check(query, language, input, bind, named, pretty, syntax_only),
        Commands::Parse {
            query,
            language,
            unparse,
        } => run_parse(query, language, unparse),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn options(query: String, language: LanguageArgs) -> CheckOptions {
    CheckOptions {
        query,
        sql: language.sql,
        extended: language.extended,
        strict: language.strict,
        ..CheckOptions::default()
    }
}

fn run_check(
    query: String,
    language: LanguageArgs,
    input: Option<String>,
    bind: Option<String>,
    named: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = match input {
        Some(s) => Some(s),
        None if !syntax_only && !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Some(buffer)
        }
        None => None,
    };

    let options = CheckOptions {
        input,
        syntax_only,
        bind: bind.as_deref().map(cli::parse_bindings).transpose()?.unwrap_or_default(),
        named: named
            .as_deref()
            .map(cli::parse_named_bindings)
            .transpose()?
            .unwrap_or_default(),
        ..options(query, language)
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Success(output) => {
            let json = if pretty {
                serde_json::to_string_pretty(&output)
            } else {
                serde_json::to_string(&output)
            }?;
            println!("{}", json);
        }
    }
    Ok(())
}

fn run_parse(query: String, language: LanguageArgs, render: bool) -> Result<(), CliError> {
    for term in cli::parse_term(&options(query, language))? {
        if render {
            println!("{}", unparse(&term));
        } else {
            println!("{}", term);
        }
    }
    Ok(())
}
