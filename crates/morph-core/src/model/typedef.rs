//! Type metadata: classes, interfaces and enumerations.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::object::ObjectRef;
use super::registry::TypeRegistry;
use super::type_name::TypeName;
use super::types::TypeRef;
use super::value::Value;
use crate::errors::ExtensionError;

pub type GetterFn = Arc<dyn Fn(&ObjectRef) -> Result<Value, ExtensionError> + Send + Sync>;
pub type SetterFn = Arc<dyn Fn(&ObjectRef, Value) -> Result<(), ExtensionError> + Send + Sync>;
pub type CreateFn = Arc<dyn Fn(&TypeRegistry) -> Result<Value, ExtensionError> + Send + Sync>;
pub type StringConstructorFn =
    Arc<dyn Fn(&TypeRegistry, &str) -> Result<Value, ExtensionError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    Class { is_abstract: bool },
    Interface,
    Enum { variants: Vec<String> },
}

/// Whether a field is reachable through property access or only directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: TypeRef,
    pub visibility: Visibility,
}

/// Native equality of instances of a type.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Equality {
    /// Two handles are equal only if they are the same object.
    #[default]
    Identity,
    /// Same type and equal values in every listed field.
    Fields(Vec<String>),
}

pub struct TypeDef {
    name: TypeName,
    kind: TypeKind,
    parent: Option<TypeName>,
    interfaces: Vec<TypeName>,
    fields: Vec<FieldDef>,
    getters: FxHashMap<String, (TypeRef, GetterFn)>,
    setters: FxHashMap<String, (TypeRef, SetterFn)>,
    create_methods: FxHashMap<String, CreateFn>,
    string_constructor: Option<StringConstructorFn>,
    equality: Equality,
}

impl TypeDef {
    pub fn class(name: impl Into<TypeName>) -> TypeDefBuilder {
        TypeDefBuilder::new(name.into(), TypeKind::Class { is_abstract: false })
    }

    pub fn abstract_class(name: impl Into<TypeName>) -> TypeDefBuilder {
        TypeDefBuilder::new(name.into(), TypeKind::Class { is_abstract: true })
    }

    pub fn interface(name: impl Into<TypeName>) -> TypeDefBuilder {
        TypeDefBuilder::new(name.into(), TypeKind::Interface)
    }

    pub fn enumeration<I, S>(name: impl Into<TypeName>, variants: I) -> TypeDefBuilder
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeDefBuilder::new(
            name.into(),
            TypeKind::Enum {
                variants: variants.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn name(&self) -> &TypeName {
        &self.name
    }

    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<&TypeName> {
        self.parent.as_ref()
    }

    pub fn interfaces(&self) -> &[TypeName] {
        &self.interfaces
    }

    /// Fields declared directly on this type (not inherited).
    pub fn declared_fields(&self) -> &[FieldDef] {
        &self.fields
    }

    pub fn declared_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn declared_getter(&self, name: &str) -> Option<&(TypeRef, GetterFn)> {
        self.getters.get(name)
    }

    pub fn declared_setter(&self, name: &str) -> Option<&(TypeRef, SetterFn)> {
        self.setters.get(name)
    }

    pub fn getter_names(&self) -> impl Iterator<Item = &str> {
        self.getters.keys().map(String::as_str)
    }

    pub fn setter_names(&self) -> impl Iterator<Item = &str> {
        self.setters.keys().map(String::as_str)
    }

    pub fn create_method(&self, name: &str) -> Option<&CreateFn> {
        self.create_methods.get(name)
    }

    pub fn string_constructor(&self) -> Option<&StringConstructorFn> {
        self.string_constructor.as_ref()
    }

    pub fn equality(&self) -> &Equality {
        &self.equality
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, TypeKind::Interface)
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum { .. })
    }

    pub fn is_instantiable(&self) -> bool {
        matches!(self.kind, TypeKind::Class { is_abstract: false })
    }

    pub fn enum_variants(&self) -> &[String] {
        match &self.kind {
            TypeKind::Enum { variants } => variants,
            _ => &[],
        }
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("interfaces", &self.interfaces)
            .field("fields", &self.fields)
            .field("getters", &self.getters.keys().collect::<Vec<_>>())
            .field("setters", &self.setters.keys().collect::<Vec<_>>())
            .field("equality", &self.equality)
            .finish()
    }
}

/// Fluent builder for [`TypeDef`].
pub struct TypeDefBuilder {
    def: TypeDef,
}

impl TypeDefBuilder {
    fn new(name: TypeName, kind: TypeKind) -> Self {
        Self {
            def: TypeDef {
                name,
                kind,
                parent: None,
                interfaces: Vec::new(),
                fields: Vec::new(),
                getters: FxHashMap::default(),
                setters: FxHashMap::default(),
                create_methods: FxHashMap::default(),
                string_constructor: None,
                equality: Equality::Identity,
            },
        }
    }

    pub fn extends(mut self, parent: impl Into<TypeName>) -> Self {
        self.def.parent = Some(parent.into());
        self
    }

    pub fn implements(mut self, iface: impl Into<TypeName>) -> Self {
        self.def.interfaces.push(iface.into());
        self
    }

    /// A field reachable both directly and through property access.
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.def.fields.push(FieldDef {
            name: name.into(),
            ty: ty.into(),
            visibility: Visibility::Public,
        });
        self
    }

    /// A field reachable only through direct field access or explicit methods.
    pub fn private_field(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.def.fields.push(FieldDef {
            name: name.into(),
            ty: ty.into(),
            visibility: Visibility::Private,
        });
        self
    }

    pub fn getter<F>(mut self, name: impl Into<String>, returns: impl Into<TypeRef>, f: F) -> Self
    where
        F: Fn(&ObjectRef) -> Result<Value, ExtensionError> + Send + Sync + 'static,
    {
        self.def
            .getters
            .insert(name.into(), (returns.into(), Arc::new(f)));
        self
    }

    pub fn setter<F>(mut self, name: impl Into<String>, param: impl Into<TypeRef>, f: F) -> Self
    where
        F: Fn(&ObjectRef, Value) -> Result<(), ExtensionError> + Send + Sync + 'static,
    {
        self.def.setters.insert(name.into(), (param.into(), Arc::new(f)));
        self
    }

    pub fn create_method<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&TypeRegistry) -> Result<Value, ExtensionError> + Send + Sync + 'static,
    {
        self.def.create_methods.insert(name.into(), Arc::new(f));
        self
    }

    pub fn string_constructor<F>(mut self, f: F) -> Self
    where
        F: Fn(&TypeRegistry, &str) -> Result<Value, ExtensionError> + Send + Sync + 'static,
    {
        self.def.string_constructor = Some(Arc::new(f));
        self
    }

    pub fn equality_on<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.def.equality = Equality::Fields(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn build(self) -> TypeDef {
        self.def
    }
}
