//! Property keys and accesses named by template source.

use super::context::TemplateContext;
use crate::emit::source;
use crate::features;
use crate::names::helper;
use crate::text;
use source_map::CodeInfo;

fn is_bracketed(code: &str) -> bool {
    code.len() >= 2 && code.starts_with('[') && code.ends_with(']')
}

impl TemplateContext<'_> {
    /// An object literal key. `[expr]` keys are computed; with `constant`
    /// the key is narrowed to a literal type.
    pub fn object_property(&mut self, code: &str, offset: u32, info: CodeInfo, camelize: bool, constant: bool) {
        if is_bracketed(code) {
            if constant {
                let prefix = format!("[{}(", helper::TRY_AS_CONSTANT);
                self.interpolation(source::TEMPLATE, &code[1..code.len() - 1], offset + 1, info, &prefix, ")]");
            } else {
                self.interpolation(source::TEMPLATE, code, offset, info, "", "");
            }
        } else if camelize {
            if text::is_identifier(&text::camelize(code)) {
                self.codes.camelized(code, source::TEMPLATE, offset, info, None);
            } else {
                let boundary = self.codes.open(source::TEMPLATE, offset, info);
                self.codes.text("\"");
                self.codes.camelized(code, source::TEMPLATE, offset, features::NONE, Some(boundary));
                self.codes.text("\"");
                self.codes.close(boundary, offset + code.len() as u32);
            }
        } else if text::is_identifier(code) {
            self.codes.mapped(code, source::TEMPLATE, offset, info);
        } else {
            self.codes.string_literal_key(code, Some((source::TEMPLATE, offset, info)));
        }
    }

    /// `.name`, `["name"]` or a computed `[expr]` access.
    pub fn property_access(&mut self, code: &str, offset: u32, info: CodeInfo) {
        if is_bracketed(code) {
            self.interpolation(source::TEMPLATE, code, offset, info, "", "");
        } else if text::is_identifier(code) {
            self.codes.text(".");
            self.codes.mapped(code, source::TEMPLATE, offset, info);
        } else {
            self.codes.text("[");
            self.codes.string_literal_key(code, Some((source::TEMPLATE, offset, info)));
            self.codes.text("]");
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::emit::Codes;
    use crate::features;
    use crate::options::VueCompilerOptions;
    use crate::template::context::TemplateContext;
    use crate::template::TemplateOptions;
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashSet;

    fn with_context(f: impl FnOnce(&mut TemplateContext<'_>)) -> String {
        let compiler = VueCompilerOptions::default();
        let names = FxHashSet::default();
        let options = TemplateOptions::new(&compiler, &names, &names);
        let mut ctx = TemplateContext::new(&options, "", Codes::new());
        f(&mut ctx);
        ctx.codes.to_text()
    }

    #[test]
    fn test_object_property_keys() {
        let text = with_context(|ctx| {
            ctx.object_property("foo", 0, features::VERIFICATION, false, false);
            ctx.codes.text(" ");
            ctx.object_property("aria-label", 0, features::VERIFICATION, false, false);
            ctx.codes.text(" ");
            ctx.object_property("my-prop", 0, features::VERIFICATION, true, false);
            ctx.codes.text(" ");
            ctx.object_property("[key]", 0, features::VERIFICATION, false, true);
        });
        assert_eq!(text, "foo \"aria-label\" myProp [__VLS_tryAsConstant(__VLS_ctx.key)]");
    }

    #[test]
    fn test_property_access() {
        let text = with_context(|ctx| {
            ctx.property_access("div", 0, features::VERIFICATION);
            ctx.property_access("font-face", 0, features::VERIFICATION);
        });
        assert_eq!(text, ".div[\"font-face\"]");
    }
}
