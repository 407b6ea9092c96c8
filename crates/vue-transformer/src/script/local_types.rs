//! Helper types declared at the end of the generated file, only when used.

use indexmap::IndexSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocalType {
    PrettifyLocal,
    WithDefaults,
    WithSlots,
    TypePropsToOption,
    OmitIndexSignature,
}

impl LocalType {
    pub fn name(self) -> &'static str {
        match self {
            LocalType::PrettifyLocal => "__VLS_PrettifyLocal",
            LocalType::WithDefaults => "__VLS_WithDefaults",
            LocalType::WithSlots => "__VLS_WithSlots",
            LocalType::TypePropsToOption => "__VLS_TypePropsToOption",
            LocalType::OmitIndexSignature => "__VLS_OmitIndexSignature",
        }
    }

    fn dependencies(self) -> &'static [LocalType] {
        match self {
            LocalType::WithDefaults => &[LocalType::PrettifyLocal],
            _ => &[],
        }
    }

    fn declaration(self, lib: &str) -> String {
        match self {
            LocalType::PrettifyLocal => "type __VLS_PrettifyLocal<T> = (T extends any ? { [K in keyof T]: T[K]; } : { [K in keyof T as K]: T[K]; }) & {};\n".to_string(),
            LocalType::WithDefaults => "type __VLS_WithDefaults<P, D> = {\n\
                 \t[K in keyof Pick<P, keyof P>]: K extends keyof D\n\
                 \t\t? __VLS_PrettifyLocal<P[K] & { default: D[K] }>\n\
                 \t\t: P[K]\n\
                 };\n"
                .to_string(),
            LocalType::WithSlots => "type __VLS_WithSlots<T, S> = T & {\n\
                 \tnew(): {\n\
                 \t\t$slots: S;\n\
                 \t}\n\
                 };\n"
                .to_string(),
            LocalType::TypePropsToOption => format!(
                "type __VLS_TypePropsToOption<T> = {{\n\
                 \t[K in keyof T]-?: {{}} extends Pick<T, K>\n\
                 \t\t? {{ type: import(\"{lib}\").PropType<Required<T>[K]> }}\n\
                 \t\t: {{ type: import(\"{lib}\").PropType<T[K]>, required: true }}\n\
                 }};\n"
            ),
            LocalType::OmitIndexSignature => "type __VLS_OmitIndexSignature<T> = { [K in keyof T as {} extends Record<K, unknown> ? never : K]: T[K]; };\n".to_string(),
        }
    }
}

/// The local types referenced so far, in first-use order with dependencies
/// ahead of their users.
#[derive(Debug, Default)]
pub struct LocalTypes {
    used: IndexSet<LocalType>,
}

impl LocalTypes {
    /// Marks `ty` as used and returns its name.
    pub fn use_type(&mut self, ty: LocalType) -> &'static str {
        for dependency in ty.dependencies() {
            self.use_type(*dependency);
        }
        self.used.insert(ty);
        ty.name()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    /// Declarations of every used type.
    pub fn generate(&self, lib: &str) -> String {
        self.used.iter().map(|ty| ty.declaration(lib)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unused_types_are_not_declared() {
        let local_types = LocalTypes::default();
        assert!(local_types.is_empty());
        assert_eq!(local_types.generate("vue"), "");
    }

    #[test]
    fn test_dependencies_come_first() {
        let mut local_types = LocalTypes::default();
        assert_eq!(local_types.use_type(LocalType::WithDefaults), "__VLS_WithDefaults");
        local_types.use_type(LocalType::PrettifyLocal);
        let text = local_types.generate("vue");
        let prettify = text.find("type __VLS_PrettifyLocal").unwrap();
        let defaults = text.find("type __VLS_WithDefaults").unwrap();
        assert!(prettify < defaults);
        assert_eq!(text.matches("type __VLS_PrettifyLocal").count(), 1);
    }

    #[test]
    fn test_lib_is_substituted() {
        let mut local_types = LocalTypes::default();
        local_types.use_type(LocalType::TypePropsToOption);
        assert!(local_types.generate("@vue/runtime-dom").contains("import(\"@vue/runtime-dom\").PropType"));
    }
}
