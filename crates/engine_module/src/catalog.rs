//! System descriptors and the immutable system catalog.
//!
//! A [`SystemDescriptor`] declares what a system touches, argument by
//! argument, and the function the host calls to run it. The module builds
//! its [`SystemCatalog`] once; the host walks it through the introspection
//! entry points to build its dependency graph before any system runs.

use std::collections::BTreeSet;
use std::ffi::c_void;

use crate::error::ModuleError;
use crate::identifier::Identifier;

/// Entry point of a system. The host passes the base of the argument-pointer
/// array; the return value is `0` on success.
pub type SystemFn = unsafe extern "C" fn(args: *const c_void) -> usize;

/// Access mode of a system argument.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgType {
    /// Mutable access to a component or resource.
    DataAccessMut = 0,
    /// Shared access to a component or resource.
    DataAccessRef = 1,
    /// Reads from a typed event queue.
    EventReader = 2,
    /// Writes to a typed event queue.
    EventWriter = 3,
    /// A multi-entity view over one or more components.
    Query = 4,
}

/// Access to a single component, either direct or inside a [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentAccess {
    pub component: Identifier,
    pub mutable: bool,
}

impl ComponentAccess {
    /// The argument type the host sees for this access.
    #[must_use]
    pub fn arg_type(&self) -> ArgType {
        if self.mutable {
            ArgType::DataAccessMut
        } else {
            ArgType::DataAccessRef
        }
    }
}

/// Ordered component accesses making up a query argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    accesses: Vec<ComponentAccess>,
}

impl Query {
    /// Create an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a read-only component.
    #[must_use]
    pub fn read(mut self, component: Identifier) -> Self {
        self.accesses.push(ComponentAccess {
            component,
            mutable: false,
        });
        self
    }

    /// Add a mutable component.
    #[must_use]
    pub fn write(mut self, component: Identifier) -> Self {
        self.accesses.push(ComponentAccess {
            component,
            mutable: true,
        });
        self
    }

    /// The accesses in declaration order.
    #[must_use]
    pub fn accesses(&self) -> &[ComponentAccess] {
        &self.accesses
    }

    /// Returns `true` if any access is mutable.
    #[must_use]
    pub fn has_mutable_access(&self) -> bool {
        self.accesses.iter().any(|a| a.mutable)
    }
}

/// One declared system argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SystemArg {
    Component(ComponentAccess),
    EventReader(Identifier),
    EventWriter(Identifier),
    Query(Query),
}

impl SystemArg {
    #[must_use]
    pub fn arg_type(&self) -> ArgType {
        match self {
            Self::Component(access) => access.arg_type(),
            Self::EventReader(_) => ArgType::EventReader,
            Self::EventWriter(_) => ArgType::EventWriter,
            Self::Query(_) => ArgType::Query,
        }
    }

    /// The identifiers this argument references, in order. Events and direct
    /// component accesses reference exactly one.
    #[must_use]
    pub fn identifiers(&self) -> Vec<&Identifier> {
        match self {
            Self::Component(access) => vec![&access.component],
            Self::EventReader(id) | Self::EventWriter(id) => vec![id],
            Self::Query(query) => query.accesses.iter().map(|a| &a.component).collect(),
        }
    }

    /// The event identifier, if this is an event argument.
    #[must_use]
    pub fn event(&self) -> Option<&Identifier> {
        match self {
            Self::EventReader(id) | Self::EventWriter(id) => Some(id),
            _ => None,
        }
    }
}

/// Component identifiers a system reads and writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessSet {
    pub reads: BTreeSet<Identifier>,
    pub writes: BTreeSet<Identifier>,
}

impl AccessSet {
    /// Two access sets conflict when one writes something the other reads or
    /// writes:
    ///
    /// ```text
    /// A.writes ∩ (B.reads ∪ B.writes) ≠ ∅  OR
    /// B.writes ∩ (A.reads ∪ A.writes) ≠ ∅
    /// ```
    #[must_use]
    pub fn conflicts_with(&self, other: &AccessSet) -> bool {
        let hits = |writes: &BTreeSet<Identifier>, set: &AccessSet| {
            writes
                .iter()
                .any(|w| set.reads.contains(w) || set.writes.contains(w))
        };
        hits(&self.writes, other) || hits(&other.writes, self)
    }
}

/// Static description of one system.
#[derive(Debug, Clone)]
pub struct SystemDescriptor {
    once: bool,
    args: Vec<SystemArg>,
    function: SystemFn,
}

impl SystemDescriptor {
    /// Describe a system with no arguments that runs every frame.
    #[must_use]
    pub fn new(function: SystemFn) -> Self {
        Self {
            once: false,
            args: Vec::new(),
            function,
        }
    }

    /// Mark the system as run-once.
    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Append an argument.
    #[must_use]
    pub fn arg(mut self, arg: SystemArg) -> Self {
        self.args.push(arg);
        self
    }

    /// Append shared access to a component or resource.
    #[must_use]
    pub fn read(self, component: Identifier) -> Self {
        self.arg(SystemArg::Component(ComponentAccess {
            component,
            mutable: false,
        }))
    }

    /// Append mutable access to a component or resource.
    #[must_use]
    pub fn write(self, component: Identifier) -> Self {
        self.arg(SystemArg::Component(ComponentAccess {
            component,
            mutable: true,
        }))
    }

    #[must_use]
    pub fn event_reader(self, event: Identifier) -> Self {
        self.arg(SystemArg::EventReader(event))
    }

    #[must_use]
    pub fn event_writer(self, event: Identifier) -> Self {
        self.arg(SystemArg::EventWriter(event))
    }

    #[must_use]
    pub fn query(self, query: Query) -> Self {
        self.arg(SystemArg::Query(query))
    }

    #[must_use]
    pub fn is_once(&self) -> bool {
        self.once
    }

    #[must_use]
    pub fn function(&self) -> SystemFn {
        self.function
    }

    #[must_use]
    pub fn args(&self) -> &[SystemArg] {
        &self.args
    }

    /// Bounds-checked argument access.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::OutOfRange`] if `index >= args().len()`.
    pub fn arg_at(&self, index: usize) -> Result<&SystemArg, ModuleError> {
        self.args.get(index).ok_or(ModuleError::OutOfRange {
            what: "argument",
            index,
            len: self.args.len(),
        })
    }

    /// The component reads and writes of this system. Events are channels,
    /// not component data, and do not contribute.
    #[must_use]
    pub fn access(&self) -> AccessSet {
        let mut set = AccessSet::default();
        for access in self.component_accesses() {
            if access.mutable {
                set.writes.insert(access.component.clone());
            } else {
                set.reads.insert(access.component.clone());
            }
        }
        set
    }

    /// Checks whether this system may not run concurrently with `other`.
    #[must_use]
    pub fn conflicts_with(&self, other: &SystemDescriptor) -> bool {
        self.access().conflicts_with(&other.access())
    }

    fn component_accesses(&self) -> impl Iterator<Item = &ComponentAccess> {
        self.args.iter().flat_map(|arg| match arg {
            SystemArg::Component(access) => std::slice::from_ref(access),
            SystemArg::Query(query) => query.accesses.as_slice(),
            SystemArg::EventReader(_) | SystemArg::EventWriter(_) => &[][..],
        })
    }

    fn validate(&self, system: usize) -> Result<(), ModuleError> {
        let invalid = |reason: String| ModuleError::InvalidCatalog { system, reason };

        for (index, arg) in self.args.iter().enumerate() {
            if let SystemArg::Query(query) = arg
                && query.accesses.is_empty()
            {
                return Err(invalid(format!("query argument {index} has no components")));
            }
        }

        // A component written by one argument may not be accessed by any other.
        let accesses: Vec<_> = self.component_accesses().collect();
        for (i, a) in accesses.iter().enumerate() {
            let aliased = accesses
                .iter()
                .skip(i + 1)
                .any(|b| b.component == a.component && (a.mutable || b.mutable));
            if aliased {
                return Err(invalid(format!(
                    "component `{}` is written and accessed by another argument",
                    a.component
                )));
            }
        }
        Ok(())
    }
}

/// The module's ordered, immutable list of systems.
#[derive(Debug, Clone, Default)]
pub struct SystemCatalog {
    systems: Vec<SystemDescriptor>,
}

impl SystemCatalog {
    /// Build and validate the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::InvalidCatalog`] if a query has no components or
    /// a system aliases a mutable component access.
    pub fn new(systems: Vec<SystemDescriptor>) -> Result<Self, ModuleError> {
        for (index, system) in systems.iter().enumerate() {
            system.validate(index)?;
        }
        Ok(Self { systems })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SystemDescriptor> {
        self.systems.iter()
    }

    /// Bounds-checked system access.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleError::OutOfRange`] if `index >= len()`.
    pub fn get(&self, index: usize) -> Result<&SystemDescriptor, ModuleError> {
        self.systems.get(index).ok_or(ModuleError::OutOfRange {
            what: "system",
            index,
            len: self.systems.len(),
        })
    }

    pub fn is_once(&self, system: usize) -> Result<bool, ModuleError> {
        Ok(self.get(system)?.once)
    }

    pub fn function(&self, system: usize) -> Result<SystemFn, ModuleError> {
        Ok(self.get(system)?.function)
    }

    pub fn args_len(&self, system: usize) -> Result<usize, ModuleError> {
        Ok(self.get(system)?.args.len())
    }

    pub fn arg_type(&self, system: usize, arg: usize) -> Result<ArgType, ModuleError> {
        Ok(self.get(system)?.arg_at(arg)?.arg_type())
    }

    /// The event identifier of an event argument.
    ///
    /// # Errors
    ///
    /// [`ModuleError::OutOfRange`] for bad indices, [`ModuleError::TypeMismatch`]
    /// if the argument is not an `EventReader` or `EventWriter`.
    pub fn arg_event(&self, system: usize, arg: usize) -> Result<&Identifier, ModuleError> {
        let arg = self.get(system)?.arg_at(arg)?;
        arg.event()
            .ok_or_else(|| ModuleError::arg_mismatch("an event argument", arg.arg_type()))
    }

    /// The component identifier of a direct component argument.
    ///
    /// # Errors
    ///
    /// [`ModuleError::OutOfRange`] for bad indices, [`ModuleError::TypeMismatch`]
    /// if the argument is not `DataAccessMut` or `DataAccessRef`.
    pub fn arg_component(&self, system: usize, arg: usize) -> Result<&Identifier, ModuleError> {
        match self.get(system)?.arg_at(arg)? {
            SystemArg::Component(access) => Ok(&access.component),
            other => Err(ModuleError::arg_mismatch(
                "a component argument",
                other.arg_type(),
            )),
        }
    }

    /// The query behind a `Query` argument.
    ///
    /// # Errors
    ///
    /// [`ModuleError::OutOfRange`] for bad indices, [`ModuleError::TypeMismatch`]
    /// if the argument is not a query.
    pub fn arg_query(&self, system: usize, arg: usize) -> Result<&Query, ModuleError> {
        match self.get(system)?.arg_at(arg)? {
            SystemArg::Query(query) => Ok(query),
            other => Err(ModuleError::arg_mismatch("a query argument", other.arg_type())),
        }
    }

    pub fn query_args_len(&self, system: usize, arg: usize) -> Result<usize, ModuleError> {
        Ok(self.arg_query(system, arg)?.accesses.len())
    }

    /// Bounds-checked access to one component of a query argument.
    pub fn query_arg(
        &self,
        system: usize,
        arg: usize,
        query_arg: usize,
    ) -> Result<&ComponentAccess, ModuleError> {
        let query = self.arg_query(system, arg)?;
        query
            .accesses
            .get(query_arg)
            .ok_or(ModuleError::OutOfRange {
                what: "query argument",
                index: query_arg,
                len: query.accesses.len(),
            })
    }

    pub fn query_arg_type(
        &self,
        system: usize,
        arg: usize,
        query_arg: usize,
    ) -> Result<ArgType, ModuleError> {
        Ok(self.query_arg(system, arg, query_arg)?.arg_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn noop_system(_args: *const c_void) -> usize {
        0
    }

    fn ident(name: &str) -> Identifier {
        Identifier::new(name).unwrap()
    }

    fn sample_catalog() -> SystemCatalog {
        SystemCatalog::new(vec![
            SystemDescriptor::new(noop_system)
                .once()
                .write(ident("Transform"))
                .event_reader(ident("Input.Key")),
            SystemDescriptor::new(noop_system)
                .event_writer(ident("Graphics.DrawCircle"))
                .query(Query::new().read(ident("Transform")).write(ident("Velocity"))),
        ])
        .unwrap()
    }

    #[test]
    fn test_basic_introspection() {
        let catalog = sample_catalog();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.is_once(0).unwrap());
        assert!(!catalog.is_once(1).unwrap());
        assert_eq!(catalog.args_len(0).unwrap(), 2);
        assert_eq!(catalog.arg_type(0, 0).unwrap(), ArgType::DataAccessMut);
        assert_eq!(catalog.arg_type(0, 1).unwrap(), ArgType::EventReader);
        assert_eq!(catalog.arg_type(1, 0).unwrap(), ArgType::EventWriter);
        assert_eq!(catalog.arg_type(1, 1).unwrap(), ArgType::Query);
        assert_eq!(
            catalog.function(1).unwrap() as usize,
            noop_system as SystemFn as usize
        );
    }

    #[test]
    fn test_introspection_is_idempotent() {
        let catalog = sample_catalog();
        for _ in 0..3 {
            assert_eq!(catalog.arg_type(1, 1).unwrap(), ArgType::Query);
            assert_eq!(catalog.arg_event(1, 0).unwrap(), &ident("Graphics.DrawCircle"));
        }
    }

    #[test]
    fn test_out_of_range_indices() {
        let catalog = sample_catalog();
        assert!(matches!(
            catalog.is_once(2),
            Err(ModuleError::OutOfRange { what: "system", index: 2, len: 2 })
        ));
        assert!(matches!(
            catalog.arg_type(0, 5),
            Err(ModuleError::OutOfRange { what: "argument", .. })
        ));
        assert!(matches!(
            catalog.query_arg_type(1, 1, 2),
            Err(ModuleError::OutOfRange { what: "query argument", .. })
        ));
        assert!(matches!(catalog.function(usize::MAX), Err(ModuleError::OutOfRange { .. })));
    }

    #[test]
    fn test_event_identifier_on_non_event_argument_is_mismatch() {
        let catalog = sample_catalog();
        assert!(matches!(
            catalog.arg_event(0, 0),
            Err(ModuleError::TypeMismatch { .. })
        ));
        assert_eq!(catalog.arg_event(0, 1).unwrap(), &ident("Input.Key"));
    }

    #[test]
    fn test_component_and_query_kind_checks() {
        let catalog = sample_catalog();
        assert_eq!(catalog.arg_component(0, 0).unwrap(), &ident("Transform"));
        assert!(matches!(
            catalog.arg_component(1, 0),
            Err(ModuleError::TypeMismatch { .. })
        ));
        assert!(matches!(
            catalog.query_args_len(0, 0),
            Err(ModuleError::TypeMismatch { .. })
        ));
        assert_eq!(catalog.query_args_len(1, 1).unwrap(), 2);
        assert_eq!(catalog.query_arg_type(1, 1, 0).unwrap(), ArgType::DataAccessRef);
        assert_eq!(catalog.query_arg_type(1, 1, 1).unwrap(), ArgType::DataAccessMut);
    }

    #[test]
    fn test_identifier_lists_match_arguments() {
        let catalog = sample_catalog();
        for system in catalog.iter() {
            for arg in system.args() {
                let ids = arg.identifiers();
                assert!(!ids.is_empty());
                if arg.event().is_some() {
                    assert_eq!(ids.len(), 1);
                }
            }
        }
    }

    #[test]
    fn test_empty_query_is_rejected() {
        let result = SystemCatalog::new(vec![
            SystemDescriptor::new(noop_system).query(Query::new()),
        ]);
        assert!(matches!(
            result,
            Err(ModuleError::InvalidCatalog { system: 0, .. })
        ));
    }

    #[test]
    fn test_aliased_mutable_access_is_rejected() {
        let result = SystemCatalog::new(vec![
            SystemDescriptor::new(noop_system).read(ident("Transform")),
            SystemDescriptor::new(noop_system)
                .write(ident("Transform"))
                .query(Query::new().read(ident("Transform"))),
        ]);
        assert!(matches!(
            result,
            Err(ModuleError::InvalidCatalog { system: 1, .. })
        ));
    }

    #[test]
    fn test_write_alongside_read_names_the_component() {
        let result = SystemCatalog::new(vec![
            SystemDescriptor::new(noop_system)
                .read(ident("Transform"))
                .query(Query::new().write(ident("Transform"))),
        ]);
        match result {
            Err(ModuleError::InvalidCatalog { system: 0, reason }) => assert_eq!(
                reason,
                "component `Transform` is written and accessed by another argument"
            ),
            other => panic!("expected InvalidCatalog, got {other:?}"),
        }
    }

    #[test]
    fn test_shared_reads_are_allowed() {
        let result = SystemCatalog::new(vec![
            SystemDescriptor::new(noop_system)
                .read(ident("Transform"))
                .query(Query::new().read(ident("Transform"))),
        ]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_conflicts_between_systems() {
        let physics = SystemDescriptor::new(noop_system)
            .read(ident("Transform"))
            .write(ident("Velocity"));
        let ai = SystemDescriptor::new(noop_system)
            .read(ident("Transform"))
            .write(ident("AiState"));
        let movement = SystemDescriptor::new(noop_system)
            .query(Query::new().read(ident("Velocity")).write(ident("Transform")));

        assert!(!physics.conflicts_with(&ai));
        assert!(physics.conflicts_with(&movement));
        assert!(ai.conflicts_with(&movement));
    }

    #[test]
    fn test_events_do_not_contribute_to_access() {
        let a = SystemDescriptor::new(noop_system).event_writer(ident("Graphics.DrawLine"));
        let b = SystemDescriptor::new(noop_system).event_writer(ident("Graphics.DrawLine"));
        assert!(a.access().writes.is_empty());
        assert!(!a.conflicts_with(&b));
    }
}
