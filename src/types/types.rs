use crate::{
    define_id,
    symtab::symtab::{ScopeId, SymbolId},
};

define_id!(TypeId, "ty");

impl TypeId {
    pub const INTEGER: TypeId = TypeId::from_raw(0);
    pub const REAL: TypeId = TypeId::from_raw(1);
    pub const BOOLEAN: TypeId = TypeId::from_raw(2);
    pub const CHAR: TypeId = TypeId::from_raw(3);
    pub const STRING: TypeId = TypeId::from_raw(4);
    /// Assigned to nodes that failed analysis. Compatible with everything.
    pub const ERROR: TypeId = TypeId::from_raw(5);
    /// Type of entries that carry no value: the program and procedures.
    pub const VOID: TypeId = TypeId::from_raw(6);
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeForm {
    Scalar,
    Enumeration {
        constants: Vec<SymbolId>,
    },
    Subrange {
        base: TypeId,
        min: i64,
        max: i64,
    },
    Array {
        index: TypeId,
        element: TypeId,
        min: i64,
        max: i64,
    },
    Record {
        fields: Vec<SymbolId>,
        scope: ScopeId,
    },
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Option<String>,
    pub form: TypeForm,
}

/// Every type of one compilation unit. Ids are compared for identity.
#[derive(Debug, Clone)]
pub struct TypeTable {
    types: Vec<TypeSpec>,
}

impl Default for TypeTable {
    fn default() -> Self {
        TypeTable::new()
    }
}

impl TypeTable {
    /// Creates the table holding the canonical built-in types.
    pub fn new() -> Self {
        let scalar = |name: &str| TypeSpec {
            name: Some(name.to_string()),
            form: TypeForm::Scalar,
        };

        TypeTable {
            types: vec![
                scalar("integer"),
                scalar("real"),
                scalar("boolean"),
                scalar("char"),
                scalar("string"),
                TypeSpec {
                    name: Some("<error>".to_string()),
                    form: TypeForm::Error,
                },
                scalar("void"),
            ],
        }
    }

    pub fn add(&mut self, spec: TypeSpec) -> TypeId {
        let id = TypeId::from_raw(self.types.len() as u32);
        self.types.push(spec);
        id
    }

    pub fn get(&self, id: TypeId) -> &TypeSpec {
        &self.types[id.index()]
    }

    pub fn form(&self, id: TypeId) -> &TypeForm {
        &self.types[id.index()].form
    }

    pub fn set_form(&mut self, id: TypeId, form: TypeForm) {
        self.types[id.index()].form = form;
    }

    /// Names an anonymous type the first time a type declaration binds it.
    pub fn set_name(&mut self, id: TypeId, name: &str) {
        let spec = &mut self.types[id.index()];
        if spec.name.is_none() {
            spec.name = Some(name.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Strips subrange links only.
    pub fn strip_subrange(&self, mut id: TypeId) -> TypeId {
        while let TypeForm::Subrange { base, .. } = self.form(id) {
            id = *base;
        }
        id
    }

    /// Follows subrange and array element links down to a scalar or enumeration.
    pub fn base_type(&self, mut id: TypeId) -> TypeId {
        loop {
            match self.form(id) {
                TypeForm::Subrange { base, .. } => id = *base,
                TypeForm::Array { element, .. } => id = *element,
                _ => return id,
            }
        }
    }

    pub fn is_assignable(&self, source: TypeId, target: TypeId) -> bool {
        if source == target || source == TypeId::ERROR || target == TypeId::ERROR {
            return true;
        }

        let source = self.strip_subrange(source);
        let target = self.strip_subrange(target);

        source == target || (source == TypeId::INTEGER && target == TypeId::REAL)
    }

    pub fn is_integer(&self, id: TypeId) -> bool {
        self.strip_subrange(id) == TypeId::INTEGER
    }

    pub fn is_numeric(&self, id: TypeId) -> bool {
        matches!(self.strip_subrange(id), TypeId::INTEGER | TypeId::REAL)
    }

    pub fn is_enumeration(&self, id: TypeId) -> bool {
        matches!(
            self.form(self.strip_subrange(id)),
            TypeForm::Enumeration { .. }
        )
    }

    pub fn is_ordinal(&self, id: TypeId) -> bool {
        let base = self.strip_subrange(id);
        matches!(base, TypeId::INTEGER | TypeId::CHAR | TypeId::BOOLEAN)
            || self.is_enumeration(base)
    }

    pub fn is_composite(&self, id: TypeId) -> bool {
        matches!(
            self.form(id),
            TypeForm::Array { .. } | TypeForm::Record { .. }
        )
    }

    /// Inclusive ordinal bounds of a type usable as an array index.
    pub fn ordinal_bounds(&self, id: TypeId) -> Option<(i64, i64)> {
        match self.form(id) {
            TypeForm::Subrange { min, max, .. } => Some((*min, *max)),
            TypeForm::Enumeration { constants } => Some((0, constants.len() as i64 - 1)),
            TypeForm::Scalar if id == TypeId::BOOLEAN => Some((0, 1)),
            TypeForm::Scalar if id == TypeId::CHAR => Some((0, 255)),
            _ => None,
        }
    }

    /// Element count of an array type.
    pub fn element_count(&self, id: TypeId) -> usize {
        match self.form(id) {
            TypeForm::Array { min, max, .. } if max >= min => (max - min + 1) as usize,
            _ => 0,
        }
    }

    pub fn type_name(&self, id: TypeId) -> String {
        let spec = self.get(id);
        if let Some(name) = &spec.name {
            return name.clone();
        }

        match &spec.form {
            TypeForm::Subrange { min, max, .. } => format!("{}..{}", min, max),
            TypeForm::Array { index, element, .. } => format!(
                "array[{}] of {}",
                self.type_name(*index),
                self.type_name(*element)
            ),
            TypeForm::Enumeration { constants } => format!("enumeration({})", constants.len()),
            TypeForm::Record { fields, .. } => format!("record({})", fields.len()),
            TypeForm::Scalar => "scalar".to_string(),
            TypeForm::Error => "<error>".to_string(),
        }
    }
}
