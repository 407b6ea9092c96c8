use camino::Utf8PathBuf;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::fs;
use vue_parser::parse;
use vue_transformer::{transform, CompilerOptionsBuilder, RawVueCompilerOptions, TransformOptions};

fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let path = Utf8PathBuf::from(
        args.next()
            .expect("Usage: emit_ts <file.vue> [vueCompilerOptions.json]"),
    );
    let source = fs::read_to_string(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {path}"))?;

    let mut builder = CompilerOptionsBuilder::new();
    if let Some(options_path) = args.next() {
        let text = fs::read_to_string(&options_path)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to read {options_path}"))?;
        builder.add(RawVueCompilerOptions::from_json(&text)?);
    }

    let parsed = parse(&source);
    for error in &parsed.errors {
        eprintln!("parse error: {error}");
    }
    let result = transform(
        &parsed.document,
        &TransformOptions {
            filename: Some(path),
            compiler: builder.build(),
        },
    )?;
    for error in &result.script_errors {
        eprintln!("script error at {}: {}", error.range.start, error.message);
    }
    println!("{}", result.ts_code);
    Ok(())
}
