//! The inference engine.
//!
//! Types expressions on demand instead of checking the whole program: the
//! first query walks the expression, every later query for the same node in
//! the same context is a memo hit. Results depend on two pieces of ambient
//! context besides the node itself: the current `this` binding and any
//! callback-parameter overlay, so the memo key carries a
//! [`ContextFingerprint`] alongside the node id.
//!
//! Inference never reports diagnostics. Anything it cannot see through
//! becomes `any`, and `any` flows through every operation unchanged.

use jot_ast::node::{
    ArrayLiteral, ArrowBody, ArrowFunction, AssignmentExpression, BinaryExpression, Block,
    CallExpression, ClassDeclaration, ClassMember, ConditionalExpression, Expression, Identifier,
    IndexExpression, MemberExpression, NewExpression, ObjectLiteral, Parameter, PropertyKey,
    Statement, UnaryExpression,
};
use jot_ast::types::{
    BinaryOperator, DeclarationForm, FunctionFlags, ModifierFlags, NodeId, UnaryOperator,
};
use jot_ast::visit::{walk_statement, AstVisitor};
use jot_core::InternedString;
use jot_scopes::{ScopeTree, SymbolDeclaration, SymbolId};
use jot_types::{
    BuiltinRegistry, ClassType, FunctionType, MemberTable, ParameterType, TypeId, TypeKind,
    TypeTable,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Array methods whose result depends on the receiver's element type.
const ARRAY_GENERIC_METHODS: [&str; 8] = [
    "map", "filter", "forEach", "find", "findIndex", "some", "every", "reduce",
];

/// Cap on superclass chain walks, matching the type table's own limit.
const SUPER_CHAIN_LIMIT: usize = 64;

/// The ambient context an inference result was computed under.
///
/// Two queries for the same node may legitimately produce different types:
/// a callback body typed under `number[]` and again under `string[]`, or a
/// method body typed with and without a known `this`. The fingerprint keeps
/// those results in separate memo slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ContextFingerprint {
    self_type: Option<TypeId>,
    overlay_epoch: u32,
}

/// Restores the parameter overlay to its state before a [`InferenceEngine::push_overlay`].
#[derive(Debug)]
struct OverlayFrame {
    saved_len: usize,
    saved_epoch: u32,
}

/// One ancestor on the path from the source file down to a queried node.
///
/// Cursor-driven queries (hover, completion) land on an arbitrary node with
/// none of the context a full walk would have established. The analysis
/// layer hands the engine the ancestor chain and
/// [`InferenceEngine::infer_in_context`] replays the context-establishing
/// ancestors before inferring the target.
#[derive(Debug, Clone, Copy)]
pub enum PathNode<'a> {
    Statement(&'a Statement<'a>),
    Expression(&'a Expression<'a>),
    Member(&'a ClassMember<'a>),
}

/// On-demand type inference over one bound source file.
///
/// Owns the [`TypeTable`] it allocates into; callers display and compare
/// results through `engine.types`.
pub struct InferenceEngine<'a> {
    scope_tree: &'a ScopeTree<'a>,
    pub types: TypeTable,
    registry: BuiltinRegistry,
    /// Inference results keyed by node and the context they were computed in.
    memo: FxHashMap<(NodeId, ContextFingerprint), TypeId>,
    symbol_types: FxHashMap<SymbolId, TypeId>,
    /// Symbols currently being typed. Re-entry means a cycle; the inner
    /// occurrence resolves to `any`.
    symbols_in_progress: FxHashSet<SymbolId>,
    /// Class types by declaration node, registered before members are typed
    /// so a class body can reference its own class.
    class_types: FxHashMap<NodeId, TypeId>,
    /// Innermost `this` binding. `Some(None)` inside a plain function,
    /// which sees no `this`.
    self_stack: Vec<Option<TypeId>>,
    /// Callback parameter bindings, innermost last.
    overlay: Vec<(&'a str, TypeId)>,
    overlay_epoch: u32,
    next_epoch: u32,
}

impl<'a> InferenceEngine<'a> {
    // ========================================================================
    // Construction and context
    // ========================================================================

    pub fn new(scope_tree: &'a ScopeTree<'a>) -> Self {
        let mut types = TypeTable::new();
        let registry = BuiltinRegistry::seed(&mut types);
        Self {
            scope_tree,
            types,
            registry,
            memo: FxHashMap::default(),
            symbol_types: FxHashMap::default(),
            symbols_in_progress: FxHashSet::default(),
            class_types: FxHashMap::default(),
            self_stack: Vec::new(),
            overlay: Vec::new(),
            overlay_epoch: 0,
            next_epoch: 1,
        }
    }

    pub fn registry(&self) -> &BuiltinRegistry {
        &self.registry
    }

    fn fingerprint(&self) -> ContextFingerprint {
        ContextFingerprint {
            self_type: self.current_self(),
            overlay_epoch: self.overlay_epoch,
        }
    }

    fn current_self(&self) -> Option<TypeId> {
        self.self_stack.last().copied().flatten()
    }

    fn push_self(&mut self, self_type: Option<TypeId>) {
        self.self_stack.push(self_type);
    }

    fn pop_self(&mut self) {
        self.self_stack.pop();
    }

    /// Binds callback parameters for the duration of a body walk. Every
    /// push gets a fresh epoch; popping restores the previous epoch so the
    /// surrounding context keeps its memo entries.
    fn push_overlay(&mut self, bindings: &[(&'a str, TypeId)]) -> OverlayFrame {
        let frame = OverlayFrame {
            saved_len: self.overlay.len(),
            saved_epoch: self.overlay_epoch,
        };
        self.overlay.extend_from_slice(bindings);
        self.overlay_epoch = self.next_epoch;
        self.next_epoch += 1;
        frame
    }

    fn pop_overlay(&mut self, frame: OverlayFrame) {
        self.overlay.truncate(frame.saved_len);
        self.overlay_epoch = frame.saved_epoch;
    }

    // ========================================================================
    // Expression inference
    // ========================================================================

    /// The type of an expression in the current context, memoized.
    pub fn infer_type(&mut self, expression: &'a Expression<'a>) -> TypeId {
        let key = (expression.data().id, self.fingerprint());
        if let Some(&cached) = self.memo.get(&key) {
            return cached;
        }
        let inferred = self.infer_expression(expression);
        self.memo.insert(key, inferred);
        inferred
    }

    fn infer_expression(&mut self, expression: &'a Expression<'a>) -> TypeId {
        match expression {
            Expression::Number(_) => self.types.number_type,
            Expression::String(_) => self.types.string_type,
            Expression::Template(_) => self.types.string_type,
            Expression::Boolean(_) => self.types.boolean_type,
            Expression::Null(_) => self.types.null_type,
            Expression::Undefined(_) => self.types.undefined_type,
            Expression::Array(array) => self.infer_array_literal(array),
            Expression::Object(object) => self.infer_object_literal(object),
            Expression::Identifier(identifier) => self.infer_identifier(identifier),
            Expression::This(_) => self.current_self().unwrap_or(self.types.any_type),
            Expression::Super(_) => self.infer_super(),
            Expression::Paren(paren) => self.infer_type(paren.expression),
            Expression::Member(member) => self.infer_member(member),
            Expression::Index(index) => self.infer_index(index),
            Expression::Call(call) => self.infer_call(call),
            Expression::New(new) => self.infer_new(new),
            Expression::Unary(unary) => self.infer_unary(unary),
            Expression::Update(_) => self.types.number_type,
            Expression::Binary(binary) => self.infer_binary(binary),
            Expression::Conditional(conditional) => self.infer_conditional(conditional),
            Expression::Assignment(assignment) => self.infer_assignment(assignment),
            Expression::Arrow(arrow) => self.infer_arrow_function(arrow),
            Expression::Function(function) => {
                self.function_signature(function.parameters, function.body, function.flags)
            }
            Expression::Missing(_) => self.types.any_type,
        }
    }

    /// Overlay bindings shadow ambient globals, which shadow scope symbols.
    /// An unresolved name is `any`.
    fn infer_identifier(&mut self, identifier: &Identifier<'a>) -> TypeId {
        for (name, type_id) in self.overlay.iter().rev() {
            if *name == identifier.text {
                return *type_id;
            }
        }
        if let Some(global) = self.registry.global_type(identifier.text) {
            return global;
        }
        match self
            .scope_tree
            .resolve(identifier.text, identifier.data.range.pos)
        {
            Some(symbol) => self.symbol_type(symbol),
            None => self.types.any_type,
        }
    }

    fn infer_super(&mut self) -> TypeId {
        let current = match self.current_self() {
            Some(current) => current,
            None => return self.types.any_type,
        };
        let is_instance = matches!(self.types.kind(current), TypeKind::Instance { .. });
        let parent = match self.types.kind(current) {
            TypeKind::Instance { class } => self.types.super_class_of(*class),
            TypeKind::Class(_) => self.types.super_class_of(current),
            _ => None,
        };
        match parent {
            Some(parent) if is_instance => self.types.instance_of(parent),
            Some(parent) => parent,
            None => self.types.any_type,
        }
    }

    fn infer_array_literal(&mut self, array: &'a ArrayLiteral<'a>) -> TypeId {
        if array.elements.is_empty() {
            let element = self.types.any_type;
            return self.types.array_of(element);
        }
        let mut element_types = Vec::with_capacity(array.elements.len());
        for &element in array.elements {
            element_types.push(self.infer_type(element));
        }
        let element = self.types.union_of(element_types);
        self.types.array_of(element)
    }

    fn infer_object_literal(&mut self, object: &'a ObjectLiteral<'a>) -> TypeId {
        let mut members = MemberTable::default();
        for property in object.properties {
            let name = match &property.name {
                PropertyKey::Identifier(identifier) => identifier.text.to_string(),
                PropertyKey::String(literal) => literal.value(),
                PropertyKey::Number(literal) => literal.text.to_string(),
                // No static name to record.
                PropertyKey::Computed(_) => continue,
            };
            let value_type = match property.value {
                Some(value) => self.infer_type(value),
                // Shorthand `{ width }` reads the name from scope.
                None => match &property.name {
                    PropertyKey::Identifier(identifier) => self.infer_identifier(identifier),
                    _ => self.types.any_type,
                },
            };
            let key = self.types.names().intern(&name);
            members.insert(key, value_type);
        }
        self.types.object_type(members)
    }

    fn infer_unary(&mut self, unary: &'a UnaryExpression<'a>) -> TypeId {
        match unary.operator {
            UnaryOperator::Not | UnaryOperator::Delete => self.types.boolean_type,
            UnaryOperator::TypeOf => self.types.string_type,
            UnaryOperator::Void => self.types.undefined_type,
            UnaryOperator::Plus | UnaryOperator::Minus | UnaryOperator::BitNot => {
                self.types.number_type
            }
            UnaryOperator::Await => self.infer_type(unary.operand),
        }
    }

    /// Comparisons are boolean without looking at the operands.
    fn infer_binary(&mut self, binary: &'a BinaryExpression<'a>) -> TypeId {
        if binary.operator.is_comparison() {
            return self.types.boolean_type;
        }
        let left = self.infer_type(binary.left);
        let right = self.infer_type(binary.right);
        self.binary_result(binary.operator, left, right)
    }

    fn binary_result(&mut self, operator: BinaryOperator, left: TypeId, right: TypeId) -> TypeId {
        if operator.is_comparison() {
            return self.types.boolean_type;
        }
        if operator.is_logical() {
            return self.types.union_of(vec![left, right]);
        }
        match operator {
            // `+` concatenates when either side is a string.
            BinaryOperator::Add => {
                if left == self.types.string_type || right == self.types.string_type {
                    self.types.string_type
                } else if left == self.types.number_type && right == self.types.number_type {
                    self.types.number_type
                } else {
                    self.types
                        .union_of(vec![self.types.string_type, self.types.number_type])
                }
            }
            _ => self.types.number_type,
        }
    }

    fn infer_conditional(&mut self, conditional: &'a ConditionalExpression<'a>) -> TypeId {
        let when_true = self.infer_type(conditional.when_true);
        let when_false = self.infer_type(conditional.when_false);
        if self.types.types_equal(when_true, when_false) {
            when_true
        } else {
            self.types.union_of(vec![when_true, when_false])
        }
    }

    /// A plain assignment takes the value's type; a compound one applies
    /// its binary operator to both sides.
    fn infer_assignment(&mut self, assignment: &'a AssignmentExpression<'a>) -> TypeId {
        match assignment.operator.binary_operator() {
            None => self.infer_type(assignment.value),
            Some(operator) => {
                let target = self.infer_type(assignment.target);
                let value = self.infer_type(assignment.value);
                self.binary_result(operator, target, value)
            }
        }
    }

    // ========================================================================
    // Members and indexing
    // ========================================================================

    fn infer_member(&mut self, member: &'a MemberExpression<'a>) -> TypeId {
        let object_type = self.infer_type(member.object);
        match self.member_type(object_type, member.name.text) {
            Some(member_type) => member_type,
            None => self.types.any_type,
        }
    }

    /// A member of `object_type` by name: the type's own members first,
    /// then the builtin prototype for primitives and arrays. Union members
    /// resolve per branch and join whatever was found.
    pub fn member_type(&mut self, object_type: TypeId, name: &str) -> Option<TypeId> {
        if let TypeKind::Union { members } = self.types.kind(object_type) {
            let branches = members.clone();
            let mut found = Vec::new();
            for branch in branches {
                if let Some(member_type) = self.member_type(branch, name) {
                    found.push(member_type);
                }
            }
            if found.is_empty() {
                return None;
            }
            return Some(self.types.union_of(found));
        }
        if let Some(own) = self.own_member(object_type, name) {
            return Some(own);
        }
        self.registry
            .prototype_member(&mut self.types, object_type, name)
    }

    fn own_member(&mut self, object_type: TypeId, name: &str) -> Option<TypeId> {
        let key = self.types.names().get(name)?;
        match self.types.kind(object_type) {
            TypeKind::Object { members } => members.get(&key).copied(),
            TypeKind::Instance { class } => self.instance_member(*class, key),
            TypeKind::Class(_) => self.static_member(object_type, key),
            _ => None,
        }
    }

    fn instance_member(&self, class: TypeId, key: InternedString) -> Option<TypeId> {
        let mut current = Some(class);
        let mut remaining = SUPER_CHAIN_LIMIT;
        while let Some(class_id) = current {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            match self.types.kind(class_id) {
                TypeKind::Class(class_type) => {
                    if let Some(&member) = class_type.instance_members.get(&key) {
                        return Some(member);
                    }
                    current = class_type.super_class;
                }
                _ => return None,
            }
        }
        None
    }

    fn static_member(&self, class: TypeId, key: InternedString) -> Option<TypeId> {
        let mut current = Some(class);
        let mut remaining = SUPER_CHAIN_LIMIT;
        while let Some(class_id) = current {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            match self.types.kind(class_id) {
                TypeKind::Class(class_type) => {
                    if let Some(&member) = class_type.static_members.get(&key) {
                        return Some(member);
                    }
                    current = class_type.super_class;
                }
                _ => return None,
            }
        }
        None
    }

    /// `xs[0]` yields the element type; `obj["name"]` is a member access
    /// when the index is a string literal.
    fn infer_index(&mut self, index: &'a IndexExpression<'a>) -> TypeId {
        let object_type = self.infer_type(index.object);
        if let Expression::String(literal) = index.index.unwrap_parens() {
            let name = literal.value();
            return match self.member_type(object_type, &name) {
                Some(member_type) => member_type,
                None => self.types.any_type,
            };
        }
        match self.types.kind(object_type) {
            TypeKind::Array { element } => *element,
            _ => self.types.any_type,
        }
    }

    /// Every member name reachable on `object_type`: own members along the
    /// class chain, plus builtin prototype names. Union branches contribute
    /// all of their names.
    pub fn member_names(&mut self, object_type: TypeId) -> Vec<String> {
        let mut names = Vec::new();
        let mut seen: FxHashSet<String> = FxHashSet::default();
        self.collect_own_member_names(object_type, &mut names, &mut seen);
        for name in self
            .registry
            .prototype_member_names(&self.types, object_type)
        {
            if seen.insert(name.to_string()) {
                names.push(name.to_string());
            }
        }
        names
    }

    fn collect_own_member_names(
        &self,
        object_type: TypeId,
        names: &mut Vec<String>,
        seen: &mut FxHashSet<String>,
    ) {
        match self.types.kind(object_type) {
            TypeKind::Object { members } => {
                for &key in members.keys() {
                    let name = self.types.names().resolve(key);
                    if seen.insert(name.to_string()) {
                        names.push(name.to_string());
                    }
                }
            }
            TypeKind::Instance { class } => {
                self.collect_chain_member_names(*class, false, names, seen);
            }
            TypeKind::Class(_) => {
                self.collect_chain_member_names(object_type, true, names, seen);
            }
            TypeKind::Union { members } => {
                for &branch in members {
                    self.collect_own_member_names(branch, names, seen);
                }
            }
            _ => {}
        }
    }

    fn collect_chain_member_names(
        &self,
        class: TypeId,
        statics: bool,
        names: &mut Vec<String>,
        seen: &mut FxHashSet<String>,
    ) {
        let mut current = Some(class);
        let mut remaining = SUPER_CHAIN_LIMIT;
        while let Some(class_id) = current {
            if remaining == 0 {
                return;
            }
            remaining -= 1;
            match self.types.kind(class_id) {
                TypeKind::Class(class_type) => {
                    let table = if statics {
                        &class_type.static_members
                    } else {
                        &class_type.instance_members
                    };
                    for &key in table.keys() {
                        let name = self.types.names().resolve(key);
                        if seen.insert(name.to_string()) {
                            names.push(name.to_string());
                        }
                    }
                    current = class_type.super_class;
                }
                _ => return,
            }
        }
    }

    // ========================================================================
    // Calls and construction
    // ========================================================================

    fn infer_call(&mut self, call: &'a CallExpression<'a>) -> TypeId {
        // Array generics need the receiver's element type threaded into the
        // callback; a plain signature lookup would lose it.
        if let Expression::Member(member) = call.callee.unwrap_parens() {
            if ARRAY_GENERIC_METHODS.contains(&member.name.text) {
                let receiver = self.infer_type(member.object);
                let element = match self.types.kind(receiver) {
                    TypeKind::Array { element } => Some(*element),
                    _ => None,
                };
                if let Some(element) = element {
                    return self.infer_array_method_call(
                        member.name.text,
                        element,
                        call.arguments,
                    );
                }
            }
        }
        let callee_type = self.infer_type(call.callee);
        self.call_result(callee_type)
    }

    fn call_result(&mut self, callee_type: TypeId) -> TypeId {
        match self.types.kind(callee_type) {
            TypeKind::Function(function) => function.return_type,
            _ => self.types.any_type,
        }
    }

    fn infer_array_method_call(
        &mut self,
        method: &str,
        element: TypeId,
        arguments: &'a [&'a Expression<'a>],
    ) -> TypeId {
        match method {
            "map" => {
                let mapped = match arguments.first() {
                    Some(&callback) => {
                        let index_type = self.types.number_type;
                        self.callback_return(callback, &[element, index_type])
                    }
                    None => self.types.any_type,
                };
                self.types.array_of(mapped)
            }
            "filter" => self.types.array_of(element),
            "forEach" => self.types.undefined_type,
            "find" => {
                let undefined = self.types.undefined_type;
                self.types.union_of(vec![element, undefined])
            }
            "findIndex" => self.types.number_type,
            "some" | "every" => self.types.boolean_type,
            // The accumulator is the initial value when given, else an element.
            "reduce" => match arguments.get(1) {
                Some(&initial) => self.infer_type(initial),
                None => element,
            },
            _ => self.types.any_type,
        }
    }

    /// The return type of a callback argument, with its parameters bound to
    /// `parameter_types` while the body is walked.
    fn callback_return(
        &mut self,
        callback: &'a Expression<'a>,
        parameter_types: &[TypeId],
    ) -> TypeId {
        match callback.unwrap_parens() {
            Expression::Arrow(arrow) => {
                let bindings = Self::callback_bindings(arrow.parameters, parameter_types);
                let frame = self.push_overlay(&bindings);
                let return_type = match arrow.body {
                    ArrowBody::Expression(expression) => self.infer_type(expression),
                    ArrowBody::Block(block) => self.return_type_of_block(block),
                };
                self.pop_overlay(frame);
                return_type
            }
            Expression::Function(function) => {
                let bindings = Self::callback_bindings(function.parameters, parameter_types);
                let frame = self.push_overlay(&bindings);
                self.push_self(None);
                let return_type = self.return_type_of_block(function.body);
                self.pop_self();
                self.pop_overlay(frame);
                return_type
            }
            other => {
                let callee_type = self.infer_type(other);
                self.call_result(callee_type)
            }
        }
    }

    fn callback_bindings(
        parameters: &'a [Parameter<'a>],
        parameter_types: &[TypeId],
    ) -> Vec<(&'a str, TypeId)> {
        parameters
            .iter()
            .zip(parameter_types.iter().copied())
            .map(|(parameter, type_id)| (parameter.name.text, type_id))
            .collect()
    }

    fn infer_new(&mut self, new: &'a NewExpression<'a>) -> TypeId {
        if let Expression::Identifier(identifier) = new.callee.unwrap_parens() {
            if identifier.text == "Array" {
                let element = self.types.any_type;
                return self.types.array_of(element);
            }
            if identifier.text == "Object" {
                return self.types.object_type(MemberTable::default());
            }
        }
        let callee_type = self.infer_type(new.callee);
        let is_class = matches!(self.types.kind(callee_type), TypeKind::Class(_));
        if is_class {
            self.types.instance_of(callee_type)
        } else {
            self.types.any_type
        }
    }

    // ========================================================================
    // Functions and returns
    // ========================================================================

    fn infer_arrow_function(&mut self, arrow: &'a ArrowFunction<'a>) -> TypeId {
        // No self push: arrows see the enclosing `this`.
        let parameters = self.parameter_types(arrow.parameters);
        let return_type = match arrow.body {
            ArrowBody::Expression(expression) => self.infer_type(expression),
            ArrowBody::Block(block) => self.return_type_of_block(block),
        };
        self.types.function_type(FunctionType {
            parameters,
            return_type,
            is_async: arrow.flags.contains(FunctionFlags::ASYNC),
            is_generator: false,
        })
    }

    fn function_signature(
        &mut self,
        parameters: &'a [Parameter<'a>],
        body: &'a Block<'a>,
        flags: FunctionFlags,
    ) -> TypeId {
        self.push_self(None);
        let parameter_types = self.parameter_types(parameters);
        let return_type = self.return_type_of_block(body);
        self.pop_self();
        self.types.function_type(FunctionType {
            parameters: parameter_types,
            return_type,
            is_async: flags.contains(FunctionFlags::ASYNC),
            is_generator: flags.contains(FunctionFlags::GENERATOR),
        })
    }

    /// Parameters without a default are `any`; a default types its parameter.
    fn parameter_types(&mut self, parameters: &'a [Parameter<'a>]) -> Vec<ParameterType> {
        parameters
            .iter()
            .map(|parameter| {
                let type_id = match parameter.default {
                    Some(default) => self.infer_type(default),
                    None => self.types.any_type,
                };
                ParameterType {
                    name: self.types.names().intern(parameter.name.text),
                    type_id,
                }
            })
            .collect()
    }

    /// Union of every `return` in the body; `undefined` when there are none
    /// or a `return;` is bare. Nested functions keep their own returns.
    fn return_type_of_block(&mut self, block: &'a Block<'a>) -> TypeId {
        let mut collector = ReturnCollector { engine: self, found: Vec::new() };
        collector.visit_block(block);
        let found = collector.found;
        if found.is_empty() {
            return self.types.undefined_type;
        }
        self.types.union_of(found)
    }

    // ========================================================================
    // Classes
    // ========================================================================

    /// The `Class` type of a declaration. The shell is registered before any
    /// member is typed, so `new Point()` inside `Point`'s own methods finds
    /// the class rather than recursing forever.
    pub fn class_type_of(&mut self, declaration: &'a ClassDeclaration<'a>) -> TypeId {
        let node_id = declaration.data.id;
        if let Some(&cached) = self.class_types.get(&node_id) {
            return cached;
        }
        let name = self.types.names().intern(declaration.name.text);
        let class_id = self.types.class_type(ClassType {
            name,
            super_class: None,
            constructor: None,
            static_members: MemberTable::default(),
            instance_members: MemberTable::default(),
        });
        self.class_types.insert(node_id, class_id);

        let super_class = match declaration.super_class {
            Some(identifier) => self.resolve_class_reference(identifier),
            None => None,
        };

        // Pass 1: fields and the constructor signature. Method bodies wait
        // until constructor-assigned members are known.
        let mut constructor = None;
        let mut constructor_declaration = None;
        let mut static_members = MemberTable::default();
        let mut instance_members = MemberTable::default();
        let mut methods = Vec::new();

        for member in declaration.members {
            match member {
                ClassMember::Constructor(ctor) => {
                    let instance_type = self.types.instance_of(class_id);
                    self.push_self(Some(instance_type));
                    let parameters = self.parameter_types(ctor.parameters);
                    self.pop_self();
                    constructor = Some(self.types.function_type(FunctionType {
                        parameters,
                        return_type: instance_type,
                        is_async: false,
                        is_generator: false,
                    }));
                    constructor_declaration = Some(ctor);
                }
                ClassMember::Method(method) => methods.push(method),
                ClassMember::Field(field) => {
                    let is_static = field.modifiers.contains(ModifierFlags::STATIC);
                    let self_type = if is_static {
                        class_id
                    } else {
                        self.types.instance_of(class_id)
                    };
                    self.push_self(Some(self_type));
                    let field_type = match field.initializer {
                        Some(initializer) => self.infer_type(initializer),
                        None => self.types.any_type,
                    };
                    self.pop_self();
                    let key = self.types.names().intern(field.name.text);
                    let table = if is_static {
                        &mut static_members
                    } else {
                        &mut instance_members
                    };
                    // On a duplicate name the first member wins.
                    if !table.contains_key(&key) {
                        table.insert(key, field_type);
                    }
                }
            }
        }

        // The declared shape goes in before the constructor body is
        // scanned, so `this.<field>` reads resolve during the scan.
        if let TypeKind::Class(class) = &mut self.types.get_mut(class_id).kind {
            class.super_class = super_class;
            class.constructor = constructor;
            class.static_members = static_members;
            class.instance_members = instance_members;
        }

        // Pass 2: members assigned in the constructor with no declared
        // counterpart.
        let mut scan_added = FxHashSet::default();
        if let Some(ctor) = constructor_declaration {
            let instance_type = self.types.instance_of(class_id);
            self.push_self(Some(instance_type));
            let mut assigned = Vec::new();
            self.scan_constructor_assignments(ctor.body.statements, &mut assigned);
            self.pop_self();
            if let TypeKind::Class(class) = &mut self.types.get_mut(class_id).kind {
                for (key, member_type) in assigned {
                    if !class.instance_members.contains_key(&key) {
                        class.instance_members.insert(key, member_type);
                        scan_added.insert(key);
                    }
                }
            }
        }

        // Pass 3: method bodies, which may read both fields and
        // constructor-assigned members through `this`.
        for method in methods {
            let is_static = method.modifiers.contains(ModifierFlags::STATIC);
            let self_type = if is_static {
                class_id
            } else {
                self.types.instance_of(class_id)
            };
            self.push_self(Some(self_type));
            let parameters = self.parameter_types(method.parameters);
            let return_type = self.return_type_of_block(method.body);
            self.pop_self();
            let signature = self.types.function_type(FunctionType {
                parameters,
                return_type,
                is_async: method.flags.contains(FunctionFlags::ASYNC),
                is_generator: method.flags.contains(FunctionFlags::GENERATOR),
            });
            let key = self.types.names().intern(method.name.text);
            if let TypeKind::Class(class) = &mut self.types.get_mut(class_id).kind {
                let table = if is_static {
                    &mut class.static_members
                } else {
                    &mut class.instance_members
                };
                // A declared method beats a constructor assignment of the
                // same name; between two declarations the first wins.
                if scan_added.remove(&key) || !table.contains_key(&key) {
                    table.insert(key, signature);
                }
            }
        }

        class_id
    }

    /// `this.<name> = <value>` assignments at statement level in the
    /// constructor, including inside blocks, branches, loops, and try
    /// arms. Nested functions are not scanned.
    fn scan_constructor_assignments(
        &mut self,
        statements: &'a [Statement<'a>],
        out: &mut Vec<(InternedString, TypeId)>,
    ) {
        for statement in statements {
            self.scan_constructor_statement(statement, out);
        }
    }

    fn scan_constructor_statement(
        &mut self,
        statement: &'a Statement<'a>,
        out: &mut Vec<(InternedString, TypeId)>,
    ) {
        match statement {
            Statement::Expression(expression_statement) => {
                if let Expression::Assignment(assignment) =
                    expression_statement.expression.unwrap_parens()
                {
                    if assignment.operator.binary_operator().is_none() {
                        if let Expression::Member(member) = assignment.target.unwrap_parens() {
                            if matches!(member.object.unwrap_parens(), Expression::This(_)) {
                                let value_type = self.infer_type(assignment.value);
                                let key = self.types.names().intern(member.name.text);
                                out.push((key, value_type));
                            }
                        }
                    }
                }
            }
            Statement::Block(block) => self.scan_constructor_assignments(block.statements, out),
            Statement::If(if_statement) => {
                self.scan_constructor_statement(if_statement.then_branch, out);
                if let Some(else_branch) = if_statement.else_branch {
                    self.scan_constructor_statement(else_branch, out);
                }
            }
            Statement::While(loop_statement) => {
                self.scan_constructor_statement(loop_statement.body, out)
            }
            Statement::DoWhile(loop_statement) => {
                self.scan_constructor_statement(loop_statement.body, out)
            }
            Statement::For(loop_statement) => {
                self.scan_constructor_statement(loop_statement.body, out)
            }
            Statement::ForIn(loop_statement) => {
                self.scan_constructor_statement(loop_statement.body, out)
            }
            Statement::ForOf(loop_statement) => {
                self.scan_constructor_statement(loop_statement.body, out)
            }
            Statement::Try(try_statement) => {
                self.scan_constructor_assignments(try_statement.try_block.statements, out);
                if let Some(catch_clause) = &try_statement.catch_clause {
                    self.scan_constructor_assignments(catch_clause.block.statements, out);
                }
                if let Some(finally_block) = try_statement.finally_block {
                    self.scan_constructor_assignments(finally_block.statements, out);
                }
            }
            _ => {}
        }
    }

    /// Resolves an `extends` clause: ambient classes like `Error` first,
    /// then a scope symbol that turns out to be a class.
    fn resolve_class_reference(&mut self, identifier: Identifier<'a>) -> Option<TypeId> {
        if let Some(global) = self.registry.global_type(identifier.text) {
            if matches!(self.types.kind(global), TypeKind::Class(_)) {
                return Some(global);
            }
        }
        let symbol = self
            .scope_tree
            .resolve(identifier.text, identifier.data.range.pos)?;
        let resolved = self.symbol_type(symbol);
        if matches!(self.types.kind(resolved), TypeKind::Class(_)) {
            Some(resolved)
        } else {
            None
        }
    }

    // ========================================================================
    // Symbol typing
    // ========================================================================

    /// The type of a symbol, computed from its declaration on first use and
    /// cached. A symbol whose initializer leads back to itself is `any`.
    pub fn symbol_type(&mut self, symbol: SymbolId) -> TypeId {
        if let Some(&cached) = self.symbol_types.get(&symbol) {
            return cached;
        }
        let declaration = self.scope_tree.symbol(symbol).declaration;
        // Classes break cycles through their registered shell instead of
        // the in-progress guard, so `new Point()` inside `Point` works.
        if let SymbolDeclaration::Class(class_declaration) = declaration {
            let class_id = self.class_type_of(class_declaration);
            self.symbol_types.insert(symbol, class_id);
            return class_id;
        }
        if !self.symbols_in_progress.insert(symbol) {
            return self.types.any_type;
        }
        let inferred = self.declaration_type(declaration);
        self.symbols_in_progress.remove(&symbol);
        self.symbol_types.insert(symbol, inferred);
        inferred
    }

    fn declaration_type(&mut self, declaration: SymbolDeclaration<'a>) -> TypeId {
        match declaration {
            SymbolDeclaration::Variable { form, declarator } => match declarator.initializer {
                Some(initializer) => self.infer_type(initializer),
                // An uninitialized `const` can never be assigned later.
                None if form == DeclarationForm::Const => self.types.undefined_type,
                None => self.types.any_type,
            },
            SymbolDeclaration::Function(function) => {
                self.function_signature(function.parameters, function.body, function.flags)
            }
            SymbolDeclaration::FunctionExpression(function) => {
                self.function_signature(function.parameters, function.body, function.flags)
            }
            // Handled in symbol_type; unreachable through it.
            SymbolDeclaration::Class(class_declaration) => self.class_type_of(class_declaration),
            SymbolDeclaration::Parameter(parameter) => match parameter.default {
                Some(default) => self.infer_type(default),
                None => self.types.any_type,
            },
            SymbolDeclaration::CatchBinding => self.types.any_type,
            SymbolDeclaration::ForInBinding { .. } => self.types.string_type,
            SymbolDeclaration::ForOfBinding { iterated, .. } => {
                let iterated_type = self.infer_type(iterated);
                match self.types.kind(iterated_type) {
                    TypeKind::Array { element } => *element,
                    _ => self.types.any_type,
                }
            }
            SymbolDeclaration::Import(_) => self.types.any_type,
        }
    }

    // ========================================================================
    // Cursor context reconstruction
    // ========================================================================

    /// Infers `target` as if reached by a full walk down `path`. Replays
    /// `this` bindings for class members and parameter overlays for array
    /// generic callbacks, then unwinds them.
    pub fn infer_in_context(
        &mut self,
        path: &[PathNode<'a>],
        target: &'a Expression<'a>,
    ) -> TypeId {
        let (self_pushes, overlay_frames) = self.enter_path(path);
        let inferred = self.infer_type(target);
        for frame in overlay_frames.into_iter().rev() {
            self.pop_overlay(frame);
        }
        for _ in 0..self_pushes {
            self.pop_self();
        }
        inferred
    }

    fn enter_path(&mut self, path: &[PathNode<'a>]) -> (usize, Vec<OverlayFrame>) {
        let mut self_pushes = 0;
        let mut overlay_frames = Vec::new();
        let mut current_class = None;
        for (index, &node) in path.iter().enumerate() {
            match node {
                PathNode::Statement(Statement::Class(declaration)) => {
                    current_class = Some(self.class_type_of(declaration));
                }
                PathNode::Statement(Statement::Function(_))
                | PathNode::Expression(Expression::Function(_)) => {
                    self.push_self(None);
                    self_pushes += 1;
                }
                PathNode::Member(member) => {
                    if let Some(class_id) = current_class {
                        let is_static = match member {
                            ClassMember::Constructor(_) => false,
                            ClassMember::Method(method) => {
                                method.modifiers.contains(ModifierFlags::STATIC)
                            }
                            ClassMember::Field(field) => {
                                field.modifiers.contains(ModifierFlags::STATIC)
                            }
                        };
                        let self_type = if is_static {
                            class_id
                        } else {
                            self.types.instance_of(class_id)
                        };
                        self.push_self(Some(self_type));
                        self_pushes += 1;
                    }
                }
                PathNode::Expression(Expression::Arrow(arrow)) => {
                    if let Some(frame) = self.enter_generic_callback(path, index, arrow) {
                        overlay_frames.push(frame);
                    }
                }
                _ => {}
            }
        }
        (self_pushes, overlay_frames)
    }

    /// When the arrow at `path[index]` is a callback argument of an array
    /// generic call, binds its parameters the way the full walk would.
    fn enter_generic_callback(
        &mut self,
        path: &[PathNode<'a>],
        index: usize,
        arrow: &'a ArrowFunction<'a>,
    ) -> Option<OverlayFrame> {
        if index == 0 {
            return None;
        }
        let call = match path[index - 1] {
            PathNode::Expression(Expression::Call(call)) => call,
            _ => return None,
        };
        let member = match call.callee.unwrap_parens() {
            Expression::Member(member) if ARRAY_GENERIC_METHODS.contains(&member.name.text) => {
                member
            }
            _ => return None,
        };
        let is_argument = call
            .arguments
            .iter()
            .any(|argument| argument.data().id == arrow.data.id);
        if !is_argument {
            return None;
        }
        let receiver = self.infer_type(member.object);
        let element = match self.types.kind(receiver) {
            TypeKind::Array { element } => *element,
            _ => return None,
        };
        let index_type = self.types.number_type;
        let parameter_types = if member.name.text == "reduce" {
            let accumulator = match call.arguments.get(1) {
                Some(&initial) => self.infer_type(initial),
                None => element,
            };
            vec![accumulator, element, index_type]
        } else {
            vec![element, index_type]
        };
        let bindings = Self::callback_bindings(arrow.parameters, &parameter_types);
        Some(self.push_overlay(&bindings))
    }
}

/// Gathers the type of every `return` lexically inside one function body.
///
/// Expressions are never entered, which also keeps nested arrow and
/// function-expression bodies out; their returns belong to their own
/// signatures.
struct ReturnCollector<'e, 'a> {
    engine: &'e mut InferenceEngine<'a>,
    found: Vec<TypeId>,
}

impl<'e, 'a> AstVisitor<'a> for ReturnCollector<'e, 'a> {
    fn visit_statement(&mut self, statement: &Statement<'a>) {
        match statement {
            Statement::Return(return_statement) => {
                let return_type = match return_statement.expression {
                    Some(expression) => self.engine.infer_type(expression),
                    None => self.engine.types.undefined_type,
                };
                self.found.push(return_type);
            }
            // Nested declarations own their returns.
            Statement::Function(_) | Statement::Class(_) => {}
            _ => walk_statement(self, statement),
        }
    }

    fn visit_expression(&mut self, _expression: &Expression<'a>) {}
}
