use core::any::{Any, TypeId, type_name};

use ps_utils::TypeIdMap;
use ps_utils::hash::HashMap;
use ps_utils::hash::hashbrown::hash_map::Entry;

use crate::archive::json::{JsonInputArchive, JsonOutputArchive};
use crate::archive::{InputArchive, OutputArchive, UNKNOWN_TAG};
use crate::registry::{Bindable, InputBinding, OutputBinding, Upcaster};

type InputTable<A> = HashMap<&'static str, InputBinding<A>>;
type OutputTable<A> = TypeIdMap<OutputBinding<A>>;
type ErasedTable = Box<dyn Any + Send + Sync>;

// -----------------------------------------------------------------------------
// BindingRegistry

/// Type tags, bindings and upcasters known to the process.
///
/// Holds one input table (tag to [`InputBinding`]) and one output table
/// (concrete type to [`OutputBinding`]) per archive type, plus the tag of
/// every bound type and the upcasters declared between bases and derived
/// types. Entries are only ever added: inserting a key that already exists
/// leaves the table unchanged.
///
/// The process-wide instance lives behind the functions of the
/// [`registry`](crate::registry) module; this type is what a
/// [`Registration`](crate::registry::Registration) receives.
///
/// # Example
///
/// ```
/// use ps_scribe::Scribe;
/// use ps_scribe::archive::json::{JsonInputArchive, JsonOutputArchive};
/// use ps_scribe::registry::BindingRegistry;
///
/// #[derive(Scribe, Default)]
/// #[scribe(tag = "doc.Point")]
/// struct Point {
///     x: i32,
/// }
///
/// let mut registry = BindingRegistry::empty();
/// registry.register::<Point>();
///
/// assert_eq!(registry.tag_of::<Point>(), Some("doc.Point"));
/// assert!(registry.input::<JsonInputArchive>("doc.Point").is_some());
/// assert!(registry.contains_output::<Point, JsonOutputArchive>());
/// ```
pub struct BindingRegistry {
    type_to_tag: TypeIdMap<&'static str>,
    tag_to_type: HashMap<&'static str, TypeId>,
    inputs: TypeIdMap<ErasedTable>,
    outputs: TypeIdMap<ErasedTable>,
    relations: HashMap<(TypeId, TypeId), ErasedTable>,
}

impl Default for BindingRegistry {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl BindingRegistry {
    /// Creates a registry without any entries.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            type_to_tag: TypeIdMap::new(),
            tag_to_type: HashMap::with_hasher(ps_utils::hash::FixedHashState),
            inputs: TypeIdMap::new(),
            outputs: TypeIdMap::new(),
            relations: HashMap::with_hasher(ps_utils::hash::FixedHashState),
        }
    }

    // Returns `true` if `T` owns `T::TAG`, claiming it when still free.
    fn claim_tag<T: Bindable>(&mut self) -> bool {
        let tag = T::TAG;
        let type_id = TypeId::of::<T>();

        if tag == UNKNOWN_TAG {
            log::warn!("`{}` has no type tag and cannot be bound", type_name::<T>());
            return false;
        }

        match self.tag_to_type.entry(tag) {
            Entry::Occupied(owner) if *owner.get() == type_id => true,
            Entry::Occupied(_) => {
                log::warn!(
                    "type tag `{tag}` is already taken, `{}` is not bound",
                    type_name::<T>()
                );
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(type_id);
                self.type_to_tag.try_insert(type_id, || tag);
                true
            }
        }
    }

    fn input_table<A: InputArchive>(&self) -> Option<&InputTable<A>> {
        self.inputs.get_type::<A>()?.downcast_ref()
    }

    fn output_table<A: OutputArchive>(&self) -> Option<&OutputTable<A>> {
        self.outputs.get_type::<A>()?.downcast_ref()
    }

    /// Binds `T` for the JSON archives.
    pub fn register<T: Bindable>(&mut self) {
        self.insert_input::<T, JsonInputArchive>();
        self.insert_output::<T, JsonOutputArchive>();
    }

    /// Binds `T` for input archive `A`.
    ///
    /// Returns `false` if the tag of `T` is already bound for `A`, or is taken
    /// by another type.
    pub fn insert_input<T: Bindable, A: InputArchive>(&mut self) -> bool {
        if !self.claim_tag::<T>() {
            return false;
        }
        let table = self
            .inputs
            .get_or_insert(TypeId::of::<A>(), || Box::new(InputTable::<A>::default()));
        let Some(table) = table.downcast_mut::<InputTable<A>>() else {
            return false;
        };
        match table.entry(T::TAG) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(InputBinding::of::<T>());
                log::debug!(
                    "bound `{}` as `{}` for input archive `{}`",
                    type_name::<T>(),
                    T::TAG,
                    type_name::<A>()
                );
                true
            }
        }
    }

    /// Binds `T` for output archive `A`.
    ///
    /// Returns `false` if `T` is already bound for `A`, or its tag is taken
    /// by another type.
    pub fn insert_output<T: Bindable, A: OutputArchive>(&mut self) -> bool {
        if !self.claim_tag::<T>() {
            return false;
        }
        let table = self
            .outputs
            .get_or_insert(TypeId::of::<A>(), || Box::new(OutputTable::<A>::new()));
        let Some(table) = table.downcast_mut::<OutputTable<A>>() else {
            return false;
        };
        let inserted = table.try_insert(TypeId::of::<T>(), OutputBinding::of::<T>);
        if inserted {
            log::debug!(
                "bound `{}` as `{}` for output archive `{}`",
                type_name::<T>(),
                T::TAG,
                type_name::<A>()
            );
        }
        inserted
    }

    /// Declares that values built as `T` can be stored behind pointers to `B`.
    pub fn insert_relation<B: ?Sized + 'static, T: 'static>(&mut self, upcaster: Upcaster<B>) -> bool {
        match self.relations.entry((TypeId::of::<B>(), TypeId::of::<T>())) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(Box::new(upcaster));
                log::debug!(
                    "`{}` can be read as `{}`",
                    type_name::<T>(),
                    type_name::<B>()
                );
                true
            }
        }
    }

    /// The input binding of `tag` for archive `A`.
    pub fn input<A: InputArchive>(&self, tag: &str) -> Option<InputBinding<A>> {
        self.input_table::<A>()?.get(tag).copied()
    }

    /// The output binding of the concrete type `type_id` for archive `A`.
    pub fn output<A: OutputArchive>(&self, type_id: TypeId) -> Option<OutputBinding<A>> {
        self.output_table::<A>()?.get(&type_id).copied()
    }

    /// The upcaster from the concrete type `derived` to `B`.
    pub fn upcaster<B: ?Sized + 'static>(&self, derived: TypeId) -> Option<Upcaster<B>> {
        self.relations
            .get(&(TypeId::of::<B>(), derived))?
            .downcast_ref::<Upcaster<B>>()
            .copied()
    }

    /// Returns `true` if archive `A` has an input binding for `tag`.
    pub fn contains_input<A: InputArchive>(&self, tag: &str) -> bool {
        self.input_table::<A>()
            .is_some_and(|table| table.contains_key(tag))
    }

    /// Returns `true` if archive `A` has an output binding for `T`.
    pub fn contains_output<T: 'static, A: OutputArchive>(&self) -> bool {
        self.output_table::<A>()
            .is_some_and(|table| table.contains_type::<T>())
    }

    /// The tag `T` is bound under, if any.
    #[inline]
    pub fn tag_of<T: ?Sized + 'static>(&self) -> Option<&'static str> {
        self.type_to_tag.get_type::<T>().copied()
    }

    /// The type bound under `tag`, if any.
    #[inline]
    pub fn type_of(&self, tag: &str) -> Option<TypeId> {
        self.tag_to_type.get(tag).copied()
    }

    /// Returns `true` if `T` can never be bound: it has no tag, or its tag
    /// belongs to another type.
    pub fn is_refused<T: Bindable>(&self) -> bool {
        T::TAG == UNKNOWN_TAG
            || self
                .type_of(T::TAG)
                .is_some_and(|owner| owner != TypeId::of::<T>())
    }
}

// -----------------------------------------------------------------------------
// Tests
