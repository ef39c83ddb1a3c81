use std::{
    io::{stdin, stdout, Write},
    path::{Path, PathBuf},
};

use clap::Parser;

use parser::{parse_source, ParserOptions};
use scanner::Scanner;

/// Parse Lox expressions and print their syntax trees.
#[derive(clap::Parser)]
struct Args {
    /// File to parse. Starts a prompt when omitted.
    file: Option<PathBuf>,

    /// Print the scanned tokens before the trees.
    #[arg(long)]
    tokens: bool,

    /// Maximum nesting depth of parentheses and prefix operators.
    #[arg(long, conflicts_with = "no_depth_limit")]
    max_depth: Option<usize>,

    /// Don't limit the nesting depth.
    #[arg(long)]
    no_depth_limit: bool,
}

impl Args {
    fn parser_options(&self) -> ParserOptions {
        match (self.no_depth_limit, self.max_depth) {
            (true, _) => ParserOptions { max_depth: None },
            (false, Some(max_depth)) => ParserOptions { max_depth: Some(max_depth) },
            (false, None) => ParserOptions::default(),
        }
    }
}

fn run_file(path: &Path, args: &Args) -> anyhow::Result<()> {
    run(&std::fs::read_to_string(path)?, args, &mut stdout())
}

fn run_prompt(args: &Args) -> anyhow::Result<()> {
    loop {
        print!("> ");
        stdout().flush()?;
        let mut line = String::new();
        if stdin().read_line(&mut line)? == 0 {
            return Ok(());
        }
        match run(&line, args, &mut stdout()) {
            Ok(_) => (),
            Err(e) => println!("{}", e),
        }
    }
}

fn run(source: &str, args: &Args, out: &mut impl Write) -> anyhow::Result<()> {
    if args.tokens {
        print_tokens(source, out)?;
    }

    let exprs = parse_source(source, args.parser_options())?;
    log::debug!("Parsed {} expression(s)", exprs.len());

    for expr in exprs {
        writeln!(out, "{}", expr)?;
    }
    Ok(())
}

// Scan errors are left to `parse_source` to report
fn print_tokens(source: &str, out: &mut impl Write) -> anyhow::Result<()> {
    if let Ok(tokens) = Scanner::new(source).scan_tokens() {
        for token in tokens {
            write!(out, "{}:{} {} {:?}", token.line(), token.col(), token.ty(), token.lexeme())?;
            match token.literal() {
                Some(literal) => writeln!(out, " {}", literal)?,
                None => writeln!(out)?,
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    match &args.file {
        Some(file) => run_file(file, &args),
        None => run_prompt(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        Args::parse_from(std::iter::once("rlox-expr").chain(extra.iter().copied()))
    }

    fn output(source: &str, args: &Args) -> String {
        let mut out = Vec::new();
        run(source, args, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_one_tree_per_expression() {
        assert_eq!(output("1 + 2 * 3; -(4)", &args(&[])), "(+ 1 (* 2 3))\n(- (group 4))\n");
    }

    #[test]
    fn prints_tokens() {
        assert_eq!(
            output("1 + \"a\"", &args(&["--tokens"])),
            "1:1 NUMBER \"1\" 1\n1:3 PLUS \"+\"\n1:5 STRING \"\\\"a\\\"\" a\n1:8 EOF \"\"\n(+ 1 a)\n"
        );
    }

    #[test]
    fn depth_options() {
        assert_eq!(args(&[]).parser_options(), ParserOptions::default());
        assert_eq!(args(&["--max-depth", "2"]).parser_options(), ParserOptions { max_depth: Some(2) });
        assert_eq!(args(&["--no-depth-limit"]).parser_options(), ParserOptions { max_depth: None });

        let error = run("((1))", &args(&["--max-depth", "2"]), &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(error.to_string(), "[line 1] Error at '1': Expression nested too deeply.");
    }

    #[test]
    fn reports_syntax_errors() {
        let error = run("(1 + 2", &args(&[]), &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(error.to_string(), "[line 1] Error at end: Expect ')' after expression.");
    }
}
