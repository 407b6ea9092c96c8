//! Synthetic identifiers used in generated code.
//!
//! Every name is the logical key prefixed with `__VLS_`. The helper names are
//! declared by the `@vue/language-core` template helper types that the type
//! checker loads next to the generated files; when that package adds or
//! renames a declaration, this table is updated by hand.

macro_rules! synthetic_names {
    ($($name:ident = $key:literal;)*) => {
        $(pub const $name: &str = concat!("__VLS_", $key);)*

        /// Pairs of logical key and synthetic identifier, in declaration order.
        pub const TABLE: &[(&str, &str)] = &[$(($key, $name)),*];
    };
}

/// Prefix shared by every synthetic identifier.
pub const PREFIX: &str = "__VLS_";

/// Values declared by the generated code.
pub mod value {
    synthetic_names! {
        BASE = "base";
        COMPONENTS_OPTION = "componentsOption";
        CTX = "ctx";
        DEFAULT_MODELS = "defaultModels";
        DEFAULTS = "defaults";
        DIRECTIVES = "directives";
        DIRECTIVES_OPTION = "directivesOption";
        DOLLARS = "dollars";
        EMIT = "emit";
        EXPORT = "export";
        EXPOSED = "exposed";
        INTRINSICS = "intrinsics";
        MODEL_EMIT = "modelEmit";
        PROPS = "props";
        PROPS_OPTION = "propsOption";
        SELF = "self";
        SETUP = "setup";
        SLOTS = "slots";
    }
}

/// Types declared by the generated code.
pub mod ty {
    synthetic_names! {
        EMIT = "Emit";
        EMIT_PROPS = "EmitProps";
        GLOBAL_COMPONENTS = "GlobalComponents";
        INHERITED_ATTRS = "InheritedAttrs";
        LOCAL_COMPONENTS = "LocalComponents";
        LOCAL_DIRECTIVES = "LocalDirectives";
        MODEL_EMIT = "ModelEmit";
        MODEL_PROPS = "ModelProps";
        PROPS = "Props";
        PUBLIC_PROPS = "PublicProps";
        ROOT_EL = "RootEl";
        SETUP_EXPOSED = "SetupExposed";
        SLOTS = "Slots";
        STYLE_MODULES = "StyleModules";
        TEMPLATE_REFS = "TemplateRefs";
    }
}

/// Helpers declared by the template helper types.
pub mod helper {
    synthetic_names! {
        AS_FUNCTIONAL_COMPONENT0 = "asFunctionalComponent0";
        AS_FUNCTIONAL_COMPONENT1 = "asFunctionalComponent1";
        AS_FUNCTIONAL_DIRECTIVE = "asFunctionalDirective";
        AS_FUNCTIONAL_ELEMENT0 = "asFunctionalElement0";
        AS_FUNCTIONAL_ELEMENT1 = "asFunctionalElement1";
        AS_FUNCTIONAL_SLOT = "asFunctionalSlot";
        DIRECTIVE_BINDING_REST_FIELDS = "directiveBindingRestFields";
        FUNCTIONAL_COMPONENT_ARGS_REST = "functionalComponentArgsRest";
        TRY_AS_CONSTANT = "tryAsConstant";
        V_FOR = "vFor";
        V_SLOT = "vSlot";
        CONSTRUCTOR_OVERLOADS = "ConstructorOverloads";
        ELEMENTS = "Elements";
        EMITS_TO_PROPS = "EmitsToProps";
        FUNCTIONAL_COMPONENT0 = "FunctionalComponent0";
        FUNCTIONAL_COMPONENT1 = "FunctionalComponent1";
        FUNCTIONAL_COMPONENT_CTX = "FunctionalComponentCtx";
        FUNCTIONAL_COMPONENT_PROPS = "FunctionalComponentProps";
        IS_ANY = "IsAny";
        IS_FUNCTION = "IsFunction";
        NORMALIZE_COMPONENT_EVENT = "NormalizeComponentEvent";
        NORMALIZE_EMITS = "NormalizeEmits";
        OVERLOAD_UNION = "OverloadUnion";
        OVERLOAD_UNION_INNER = "OverloadUnionInner";
        PICK_NOT_ANY = "PickNotAny";
        PRETTIFY_GLOBAL = "PrettifyGlobal";
        RESOLVE_DIRECTIVES = "ResolveDirectives";
        RESOLVE_EMITS = "ResolveEmits";
        SHORT_EMITS = "ShortEmits";
        SHORT_EMITS_TO_OBJECT = "ShortEmitsToObject";
        SPREAD_MERGE = "SpreadMerge";
        UNION_TO_INTERSECTION = "UnionToIntersection";
        WITH_COMPONENT = "WithComponent";
    }
}

/// Returns true for identifiers reserved by the generated code.
#[inline]
pub fn is_synthetic(name: &str) -> bool {
    name.starts_with(PREFIX)
}

/// Name of the `index`-th generated temporary.
pub fn temporary(index: u32) -> String {
    format!("{PREFIX}{index}")
}
