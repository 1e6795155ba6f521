//! Ambient globals and prototype member tables.
//!
//! Seeded once per analysis. Inference looks members up on the object's
//! own type first and falls back to these prototype tables, so user
//! members shadow builtins. Read-only after [`BuiltinRegistry::seed`].

use rustc_hash::FxHashMap;

use crate::types::{
    ClassType, FunctionType, MemberTable, ParameterType, TypeId, TypeKind, TypeTable,
};

/// Ambient globals plus the primitive prototype tables. Array members are
/// synthesized per query because they depend on the element type.
#[derive(Debug)]
pub struct BuiltinRegistry {
    globals: FxHashMap<&'static str, TypeId>,
    string_members: FxHashMap<&'static str, TypeId>,
    number_members: FxHashMap<&'static str, TypeId>,
    boolean_members: FxHashMap<&'static str, TypeId>,
}

impl BuiltinRegistry {
    /// Build every ambient type into `table` and return the lookup tables.
    pub fn seed(table: &mut TypeTable) -> Self {
        let string_t = table.string_type;
        let number_t = table.number_type;
        let boolean_t = table.boolean_type;
        let undefined_t = table.undefined_type;
        let any_t = table.any_type;

        // ---- string prototype ----
        let string_array = table.array_of(string_t);
        let string_or_undefined = table.union_of(vec![string_t, undefined_t]);
        let mut string_members = FxHashMap::default();
        string_members.insert("length", number_t);
        string_members.insert("charAt", function_of(table, &[("index", number_t)], string_t));
        string_members.insert("charCodeAt", function_of(table, &[("index", number_t)], number_t));
        string_members.insert("indexOf", function_of(table, &[("search", string_t)], number_t));
        string_members
            .insert("lastIndexOf", function_of(table, &[("search", string_t)], number_t));
        string_members.insert("includes", function_of(table, &[("search", string_t)], boolean_t));
        string_members.insert("startsWith", function_of(table, &[("search", string_t)], boolean_t));
        string_members.insert("endsWith", function_of(table, &[("search", string_t)], boolean_t));
        string_members
            .insert("slice", function_of(table, &[("start", number_t), ("end", number_t)], string_t));
        string_members.insert(
            "substring",
            function_of(table, &[("start", number_t), ("end", number_t)], string_t),
        );
        string_members.insert("toUpperCase", function_of(table, &[], string_t));
        string_members.insert("toLowerCase", function_of(table, &[], string_t));
        string_members.insert("trim", function_of(table, &[], string_t));
        string_members.insert("split", function_of(table, &[("separator", string_t)], string_array));
        string_members.insert(
            "replace",
            function_of(table, &[("pattern", string_t), ("replacement", string_t)], string_t),
        );
        string_members.insert("repeat", function_of(table, &[("count", number_t)], string_t));
        string_members.insert(
            "padStart",
            function_of(table, &[("length", number_t), ("pad", string_t)], string_t),
        );
        string_members.insert(
            "padEnd",
            function_of(table, &[("length", number_t), ("pad", string_t)], string_t),
        );
        string_members.insert("concat", function_of(table, &[("other", string_t)], string_t));
        string_members.insert("at", function_of(table, &[("index", number_t)], string_or_undefined));
        string_members.insert("toString", function_of(table, &[], string_t));

        // ---- number prototype ----
        let mut number_members = FxHashMap::default();
        number_members.insert("toFixed", function_of(table, &[("digits", number_t)], string_t));
        number_members
            .insert("toPrecision", function_of(table, &[("precision", number_t)], string_t));
        number_members.insert("toString", function_of(table, &[], string_t));
        number_members.insert("valueOf", function_of(table, &[], number_t));

        // ---- boolean prototype ----
        let mut boolean_members = FxHashMap::default();
        boolean_members.insert("toString", function_of(table, &[], string_t));
        boolean_members.insert("valueOf", function_of(table, &[], boolean_t));

        let mut globals = FxHashMap::default();

        // ---- console ----
        let log = function_of(table, &[("message", any_t)], undefined_t);
        let console = member_table(
            table,
            &[
                ("log", log),
                ("info", log),
                ("warn", log),
                ("error", log),
                ("debug", log),
                ("trace", log),
            ],
        );
        let console = table.object_type(console);
        globals.insert("console", console);

        // ---- Math ----
        let unary_number = function_of(table, &[("value", number_t)], number_t);
        let binary_number = function_of(table, &[("a", number_t), ("b", number_t)], number_t);
        let pow = function_of(table, &[("base", number_t), ("exponent", number_t)], number_t);
        let random = function_of(table, &[], number_t);
        let math = member_table(
            table,
            &[
                ("floor", unary_number),
                ("ceil", unary_number),
                ("round", unary_number),
                ("trunc", unary_number),
                ("abs", unary_number),
                ("sqrt", unary_number),
                ("sign", unary_number),
                ("pow", pow),
                ("min", binary_number),
                ("max", binary_number),
                ("random", random),
                ("PI", number_t),
                ("E", number_t),
            ],
        );
        let math = table.object_type(math);
        globals.insert("Math", math);

        // ---- JSON ----
        let parse = function_of(table, &[("text", string_t)], any_t);
        let stringify = function_of(table, &[("value", any_t)], string_t);
        let json = member_table(table, &[("parse", parse), ("stringify", stringify)]);
        let json = table.object_type(json);
        globals.insert("JSON", json);

        // ---- Date ----
        let date_class = ambient_class(table, "Date", None);
        let date_instance = table.instance_of(date_class);
        let date_ctor = function_of(table, &[], date_instance);
        let number_getter = function_of(table, &[], number_t);
        let string_getter = function_of(table, &[], string_t);
        let parse_time = function_of(table, &[("text", string_t)], number_t);
        let date_statics = member_table(table, &[("now", number_getter), ("parse", parse_time)]);
        let date_members = member_table(
            table,
            &[
                ("getTime", number_getter),
                ("getFullYear", number_getter),
                ("getMonth", number_getter),
                ("getDate", number_getter),
                ("getDay", number_getter),
                ("getHours", number_getter),
                ("getMinutes", number_getter),
                ("getSeconds", number_getter),
                ("toISOString", string_getter),
                ("toDateString", string_getter),
            ],
        );
        fill_class(table, date_class, Some(date_ctor), date_statics, date_members);
        globals.insert("Date", date_class);

        // ---- RegExp ----
        let regexp_class = ambient_class(table, "RegExp", None);
        let regexp_instance = table.instance_of(regexp_class);
        let regexp_ctor = function_of(table, &[("pattern", string_t)], regexp_instance);
        let exec_result = table.union_of(vec![string_array, table.null_type]);
        let test = function_of(table, &[("text", string_t)], boolean_t);
        let exec = function_of(table, &[("text", string_t)], exec_result);
        let regexp_members = member_table(
            table,
            &[
                ("test", test),
                ("exec", exec),
                ("source", string_t),
                ("flags", string_t),
                ("global", boolean_t),
                ("lastIndex", number_t),
            ],
        );
        fill_class(table, regexp_class, Some(regexp_ctor), MemberTable::default(), regexp_members);
        globals.insert("RegExp", regexp_class);

        // ---- Promise ----
        let promise_class = ambient_class(table, "Promise", None);
        let promise_instance = table.instance_of(promise_class);
        let chained = function_of(table, &[("callback", any_t)], promise_instance);
        let resolve = function_of(table, &[("value", any_t)], promise_instance);
        let reject = function_of(table, &[("reason", any_t)], promise_instance);
        let all = function_of(table, &[("values", any_t)], promise_instance);
        let promise_statics =
            member_table(table, &[("resolve", resolve), ("reject", reject), ("all", all)]);
        let promise_members = member_table(
            table,
            &[("then", chained), ("catch", chained), ("finally", chained)],
        );
        fill_class(table, promise_class, None, promise_statics, promise_members);
        globals.insert("Promise", promise_class);

        // ---- Error family ----
        let error_class = ambient_class(table, "Error", None);
        let error_instance = table.instance_of(error_class);
        let error_ctor = function_of(table, &[("message", string_t)], error_instance);
        let error_members = member_table(
            table,
            &[("message", string_t), ("name", string_t), ("stack", string_t)],
        );
        fill_class(table, error_class, Some(error_ctor), MemberTable::default(), error_members);
        globals.insert("Error", error_class);
        for name in ["TypeError", "RangeError", "SyntaxError", "ReferenceError"] {
            let subclass = ambient_class(table, name, Some(error_class));
            globals.insert(name, subclass);
        }

        // ---- ambient functions and values ----
        globals.insert("parseInt", function_of(table, &[("text", string_t)], number_t));
        globals.insert("parseFloat", function_of(table, &[("text", string_t)], number_t));
        globals.insert("isNaN", function_of(table, &[("value", any_t)], boolean_t));
        globals.insert("isFinite", function_of(table, &[("value", any_t)], boolean_t));
        globals.insert("String", function_of(table, &[("value", any_t)], string_t));
        globals.insert("Number", function_of(table, &[("value", any_t)], number_t));
        globals.insert("Boolean", function_of(table, &[("value", any_t)], boolean_t));
        globals.insert("NaN", number_t);
        globals.insert("Infinity", number_t);
        globals.insert("undefined", undefined_t);
        let global_this = table.object_type(MemberTable::default());
        globals.insert("globalThis", global_this);

        Self { globals, string_members, number_members, boolean_members }
    }

    /// Type of an ambient global, if `name` is one.
    pub fn global_type(&self, name: &str) -> Option<TypeId> {
        self.globals.get(name).copied()
    }

    /// Every ambient global name, sorted.
    pub fn global_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.globals.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Prototype member lookup for primitives and arrays. Class instances
    /// carry their members in the class type and are resolved there.
    pub fn prototype_member(
        &self,
        table: &mut TypeTable,
        type_id: TypeId,
        name: &str,
    ) -> Option<TypeId> {
        let element = match table.kind(type_id) {
            TypeKind::Primitive { name: "string" } => {
                return self.string_members.get(name).copied()
            }
            TypeKind::Primitive { name: "number" } => {
                return self.number_members.get(name).copied()
            }
            TypeKind::Primitive { name: "boolean" } => {
                return self.boolean_members.get(name).copied()
            }
            TypeKind::Array { element } => *element,
            _ => return None,
        };
        self.array_member(table, element, name)
    }

    /// Member names offered for completions after `.` on `type_id`, in
    /// stable order.
    pub fn prototype_member_names(&self, table: &TypeTable, type_id: TypeId) -> Vec<&'static str> {
        match table.kind(type_id) {
            TypeKind::Primitive { name: "string" } => {
                let mut names: Vec<_> = self.string_members.keys().copied().collect();
                names.sort_unstable();
                names
            }
            TypeKind::Primitive { name: "number" } => {
                let mut names: Vec<_> = self.number_members.keys().copied().collect();
                names.sort_unstable();
                names
            }
            TypeKind::Primitive { name: "boolean" } => {
                let mut names: Vec<_> = self.boolean_members.keys().copied().collect();
                names.sort_unstable();
                names
            }
            TypeKind::Array { .. } => ARRAY_MEMBER_NAMES.to_vec(),
            _ => Vec::new(),
        }
    }

    fn array_member(&self, table: &mut TypeTable, element: TypeId, name: &str) -> Option<TypeId> {
        let number_t = table.number_type;
        let string_t = table.string_type;
        let boolean_t = table.boolean_type;
        let undefined_t = table.undefined_type;
        let any_t = table.any_type;
        let member = match name {
            "length" => number_t,
            "push" | "unshift" => function_of(table, &[("item", element)], number_t),
            "pop" | "shift" => {
                let popped = table.union_of(vec![element, undefined_t]);
                function_of(table, &[], popped)
            }
            "includes" => function_of(table, &[("item", element)], boolean_t),
            "indexOf" | "lastIndexOf" => function_of(table, &[("item", element)], number_t),
            "join" => function_of(table, &[("separator", string_t)], string_t),
            "slice" => {
                let sliced = table.array_of(element);
                function_of(table, &[("start", number_t), ("end", number_t)], sliced)
            }
            "splice" => {
                let removed = table.array_of(element);
                function_of(table, &[("start", number_t), ("count", number_t)], removed)
            }
            "concat" => {
                let receiver = table.array_of(element);
                function_of(table, &[("other", receiver)], receiver)
            }
            "reverse" => {
                let receiver = table.array_of(element);
                function_of(table, &[], receiver)
            }
            "sort" => {
                let receiver = table.array_of(element);
                function_of(table, &[("comparator", any_t)], receiver)
            }
            // Fallback signatures; call sites route these through generic
            // inference for element-precise results.
            "map" | "flat" => {
                let produced = table.array_of(any_t);
                function_of(table, &[("callback", any_t)], produced)
            }
            "filter" => {
                let receiver = table.array_of(element);
                function_of(table, &[("callback", any_t)], receiver)
            }
            "find" => {
                let found = table.union_of(vec![element, undefined_t]);
                function_of(table, &[("callback", any_t)], found)
            }
            "findIndex" => function_of(table, &[("callback", any_t)], number_t),
            "some" | "every" => function_of(table, &[("callback", any_t)], boolean_t),
            "forEach" => function_of(table, &[("callback", any_t)], undefined_t),
            "reduce" => {
                function_of(table, &[("callback", any_t), ("initial", any_t)], any_t)
            }
            _ => return None,
        };
        Some(member)
    }
}

/// Array member names in completion order.
const ARRAY_MEMBER_NAMES: &[&str] = &[
    "length", "push", "pop", "shift", "unshift", "slice", "splice", "concat", "join", "indexOf",
    "lastIndexOf", "includes", "find", "findIndex", "filter", "map", "forEach", "reduce", "some",
    "every", "reverse", "sort", "flat",
];

fn function_of(table: &mut TypeTable, parameters: &[(&str, TypeId)], return_type: TypeId) -> TypeId {
    let parameters = parameters
        .iter()
        .map(|&(name, type_id)| ParameterType { name: table.names().intern(name), type_id })
        .collect();
    table.function_type(FunctionType {
        parameters,
        return_type,
        is_async: false,
        is_generator: false,
    })
}

fn member_table(table: &mut TypeTable, entries: &[(&str, TypeId)]) -> MemberTable {
    let mut members = MemberTable::default();
    for &(name, type_id) in entries {
        members.insert(table.names().intern(name), type_id);
    }
    members
}

fn ambient_class(table: &mut TypeTable, name: &str, super_class: Option<TypeId>) -> TypeId {
    let name = table.names().intern(name);
    table.class_type(ClassType {
        name,
        super_class,
        constructor: None,
        static_members: MemberTable::default(),
        instance_members: MemberTable::default(),
    })
}

fn fill_class(
    table: &mut TypeTable,
    class: TypeId,
    constructor: Option<TypeId>,
    static_members: MemberTable,
    instance_members: MemberTable,
) {
    if let TypeKind::Class(c) = &mut table.get_mut(class).kind {
        c.constructor = constructor;
        c.static_members = static_members;
        c.instance_members = instance_members;
    }
}
