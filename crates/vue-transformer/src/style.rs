//! Style code generation.
//!
//! `v-bind()` values in `<style>` blocks are checked like template
//! interpolations, and `<style module>` blocks produce `__VLS_StyleModules`
//! with one property per module.

use crate::emit::{source, Codes};
use crate::features;
use crate::names::{helper, ty};
use crate::template::context::TemplateContext;
use crate::template::TemplateOptions;
use indexmap::IndexSet;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use vue_parser::{BlockAttr, StyleBlock};

/// Generated style code.
#[derive(Debug)]
pub struct StyleOutput {
    pub codes: Codes,
    pub generated_types: FxHashSet<&'static str>,
    /// Context members read by `v-bind()`, in first-use order.
    pub accessed_vars: IndexSet<SmolStr>,
}

/// Generates every style block. Block `i` maps to [`source::style`]`(i)`;
/// `codes` only carries the combine token counter forward.
pub fn generate_style<'a>(options: &'a TemplateOptions<'a>, styles: &'a [StyleBlock], codes: Codes) -> StyleOutput {
    let mut ctx = TemplateContext::new(options, "", codes);
    ctx.push_scope();
    ctx.declare(options.setup_consts.iter().cloned());
    style_modules(&mut ctx, styles);
    bindings(&mut ctx, styles);
    ctx.pop_scope();

    StyleOutput {
        codes: ctx.codes,
        generated_types: ctx.generated_types,
        accessed_vars: ctx.accessed_vars,
    }
}

fn style_modules(ctx: &mut TemplateContext<'_>, styles: &[StyleBlock]) {
    let modules: Vec<(usize, &StyleBlock, &str)> = styles
        .iter()
        .enumerate()
        .filter_map(|(index, style)| {
            let name = match style.block.attrs.get("module")? {
                BlockAttr::Flag => "$style",
                BlockAttr::Value { text, .. } => text.as_str(),
            };
            Some((index, style, name))
        })
        .collect();
    if modules.is_empty() {
        return;
    }
    ctx.generated_types.insert(ty::STYLE_MODULES);

    ctx.codes.text(format!("type {} = {{\n", ty::STYLE_MODULES));
    for (index, style, name) in modules {
        ctx.codes.text(format!("{name}: "));
        if !ctx.options.compiler.strict_css_modules {
            ctx.codes.text("Record<string, string> & ");
        }
        ctx.codes.text(format!("{}<{{}}", helper::PRETTIFY_GLOBAL));
        for class_name in &style.class_names {
            let Some(name) = class_name.text.strip_prefix('.') else {
                continue;
            };
            ctx.codes.text("\n & { \"");
            ctx.codes
                .mapped(name, source::style(index), class_name.offset + 1, features::NONE);
            ctx.codes.text("\": string }");
        }
        ctx.codes.text(">;\n");
    }
    ctx.codes.text("};\n");
}

fn bindings(ctx: &mut TemplateContext<'_>, styles: &[StyleBlock]) {
    for (index, style) in styles.iter().enumerate() {
        for binding in &style.bindings {
            ctx.interpolation(
                source::style(index),
                &binding.text,
                binding.offset,
                features::VERIFICATION,
                "(",
                ")",
            );
            ctx.codes.text(";\n");
        }
    }
}
