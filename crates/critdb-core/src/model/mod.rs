//! Entity graph model: explicit registration of entities and their
//! relationship associations, consulted by the join compiler on every
//! navigation step. Pure lookup layer; no I/O.


use thiserror::Error as ThisError;

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Cardinality {
    OneToMany,
    ManyToOne,
}

///
/// AssociationDef
///
/// Relationship descriptor from a source entity to a target entity.
/// The foreign key always lives on the many side: a one-to-many names the
/// inverse many-to-one attribute on its target via `mapped_by`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AssociationDef {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub mapped_by: Option<String>,
}

impl AssociationDef {
    /// Ordered collection association; `mapped_by` names the owning
    /// many-to-one attribute on the target entity.
    #[must_use]
    pub fn one_to_many(
        name: impl Into<String>,
        target: impl Into<String>,
        mapped_by: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::OneToMany,
            mapped_by: Some(mapped_by.into()),
        }
    }

    /// Owning back-reference to the containing entity.
    #[must_use]
    pub fn many_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality: Cardinality::ManyToOne,
            mapped_by: None,
        }
    }
}

///
/// EntityDef
///
/// Declarative entity description: scalar attribute names plus association
/// descriptors, registered explicitly at startup.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityDef {
    pub name: String,
    pub attributes: Vec<String>,
    pub associations: Vec<AssociationDef>,
}

impl EntityDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            associations: Vec::new(),
        }
    }

    #[must_use]
    pub fn attribute(mut self, name: impl Into<String>) -> Self {
        self.attributes.push(name.into());
        self
    }

    #[must_use]
    pub fn association(mut self, association: AssociationDef) -> Self {
        self.associations.push(association);
        self
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    /// One-to-many associations in declaration order.
    pub fn collections(&self) -> impl Iterator<Item = &AssociationDef> {
        self.associations
            .iter()
            .filter(|a| a.cardinality == Cardinality::OneToMany)
    }
}

///
/// ModelError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("unknown entity '{entity}'")]
    UnknownEntity { entity: String },

    #[error("unknown association '{association}' on entity '{entity}'")]
    UnknownAssociation { entity: String, association: String },

    #[error("unknown attribute '{attribute}' on entity '{entity}'")]
    UnknownAttribute { entity: String, attribute: String },

    #[error("entity '{entity}' is already registered")]
    DuplicateEntity { entity: String },
}

///
/// Registry
///
/// Identity-keyed table of entity definitions. Resolution failures are
/// reported at the call that introduced them, before any storage access.
///

#[derive(Debug, Default)]
pub struct Registry {
    entities: Vec<EntityDef>,
}

impl Registry {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entities: Vec::new(),
        }
    }

    pub fn register(&mut self, def: EntityDef) -> Result<(), ModelError> {
        if self.entities.iter().any(|e| e.name == def.name) {
            return Err(ModelError::DuplicateEntity { entity: def.name });
        }
        self.entities.push(def);

        Ok(())
    }

    pub fn entity(&self, name: &str) -> Result<&EntityDef, ModelError> {
        self.entities
            .iter()
            .find(|e| e.name == name)
            .ok_or_else(|| ModelError::UnknownEntity {
                entity: name.to_string(),
            })
    }

    /// Resolve an association name on a source entity.
    pub fn association(&self, entity: &str, name: &str) -> Result<&AssociationDef, ModelError> {
        self.entity(entity)?
            .associations
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| ModelError::UnknownAssociation {
                entity: entity.to_string(),
                association: name.to_string(),
            })
    }

    /// Confirm an attribute exists on an entity.
    pub fn attribute(&self, entity: &str, attribute: &str) -> Result<(), ModelError> {
        if self.entity(entity)?.has_attribute(attribute) {
            Ok(())
        } else {
            Err(ModelError::UnknownAttribute {
                entity: entity.to_string(),
                attribute: attribute.to_string(),
            })
        }
    }
}
