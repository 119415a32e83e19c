//! Sequences: a length marker followed by one node per element.
//!
//! Dynamic containers are cleared and refilled to the length found in the
//! document. Fixed arrays load in place and require the lengths to match.
//! Elements that are pointers to polymorphic values carry their own type tag.

use alloc::collections::{LinkedList, VecDeque};

use crate::archive::{InputArchive, OutputArchive};
use crate::{LoadNew, Scribe, ScribeError};

// -----------------------------------------------------------------------------
// Helpers

fn save_seq<'a, T, A, I>(ar: &mut A, len: usize, items: I) -> Result<(), ScribeError>
where
    T: Scribe + 'a,
    A: OutputArchive,
    I: IntoIterator<Item = &'a T>,
{
    ar.write_size(len)?;
    for item in items {
        ar.write_element(item)?;
    }
    Ok(())
}

fn load_seq<T: LoadNew, A: InputArchive>(
    ar: &mut A,
    mut push: impl FnMut(T),
) -> Result<usize, ScribeError> {
    let len = ar.read_size()?;
    for _ in 0..len {
        push(ar.read_element()?);
    }
    Ok(len)
}

// -----------------------------------------------------------------------------
// Dynamic containers

macro_rules! impl_dynamic_seq {
    ($ty:ident, $push:ident) => {
        impl<T: LoadNew> Scribe for $ty<T> {
            fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
                save_seq(ar, self.len(), self)
            }

            fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
                self.clear();
                load_seq(ar, |item| self.$push(item))?;
                Ok(())
            }
        }

        impl<T: LoadNew> LoadNew for $ty<T> {
            fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
                let mut seq = $ty::new();
                seq.load(ar)?;
                Ok(seq)
            }
        }
    };
}

impl_dynamic_seq!(Vec, push);
impl_dynamic_seq!(VecDeque, push_back);
impl_dynamic_seq!(LinkedList, push_back);

// -----------------------------------------------------------------------------
// Fixed arrays

impl<T: Scribe, const N: usize> Scribe for [T; N] {
    fn save<A: OutputArchive>(&self, ar: &mut A) -> Result<(), ScribeError> {
        save_seq(ar, N, self)
    }

    fn load<A: InputArchive>(&mut self, ar: &mut A) -> Result<(), ScribeError> {
        let found = ar.read_size()?;
        if found != N {
            return Err(ScribeError::SizeMismatch { expected: N, found });
        }
        for item in self.iter_mut() {
            ar.start_element()?;
            item.load(ar)?;
            ar.finish_node()?;
        }
        Ok(())
    }
}

impl<T: LoadNew, const N: usize> LoadNew for [T; N] {
    fn load_new<A: InputArchive>(ar: &mut A) -> Result<Self, ScribeError> {
        let found = ar.read_size()?;
        if found != N {
            return Err(ScribeError::SizeMismatch { expected: N, found });
        }
        let mut items = Vec::with_capacity(N);
        load_seq(ar, |item| items.push(item))?;
        items.try_into().map_err(|items: Vec<T>| ScribeError::SizeMismatch {
            expected: N,
            found: items.len(),
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use alloc::collections::{LinkedList, VecDeque};
    use alloc::sync::Arc;

    use serde_json::json;

    use crate::archive::json::{self, JsonInputArchive};
    use crate::{Polymorphic, Scribe, ScribeError, declare_base, registry, upcaster};

    trait Part: Polymorphic + core::fmt::Debug {
        fn teeth(&self) -> u32;
    }

    declare_base!(dyn Part);

    #[derive(Scribe, Default, Debug)]
    #[scribe(tag = "container.Gear", base(dyn Part))]
    struct Gear {
        n: u32,
    }

    impl Part for Gear {
        fn teeth(&self) -> u32 {
            self.n
        }
    }

    #[test]
    fn dynamic_resizes_to_document() {
        let mut seq = vec![9_u8; 5];
        let mut ar = JsonInputArchive::from_value(json!([1, 2]));
        seq.load(&mut ar).unwrap();
        assert_eq!(seq, [1, 2]);

        let mut ar = JsonInputArchive::from_value(json!([]));
        seq.load(&mut ar).unwrap();
        assert!(seq.is_empty());

        let deque: VecDeque<i32> = json::from_value(json!([3, 4, 5])).unwrap();
        assert_eq!(deque, [3, 4, 5]);
        let list: LinkedList<bool> = json::from_value(json!([true])).unwrap();
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn nested_sequences() {
        let grid = vec![vec![1_u8, 2], vec![], vec![3]];
        let value = json::to_value(&grid).unwrap();
        assert_eq!(value, json!([[1, 2], [], [3]]));
        assert_eq!(json::from_value::<Vec<Vec<u8>>>(value).unwrap(), grid);
    }

    #[test]
    fn fixed_length_must_match() {
        assert_eq!(json::to_value(&[1_u8, 2, 3]).unwrap(), json!([1, 2, 3]));

        let mut arr = [0_u8; 3];
        let mut ar = JsonInputArchive::from_value(json!([1, 2]));
        let err = arr.load(&mut ar).unwrap_err();
        assert!(matches!(
            err,
            ScribeError::SizeMismatch {
                expected: 3,
                found: 2
            }
        ));

        let err = json::from_value::<[u8; 2]>(json!([1, 2, 3])).unwrap_err();
        assert!(matches!(
            err,
            ScribeError::SizeMismatch {
                expected: 2,
                found: 3
            }
        ));
        assert_eq!(json::from_value::<[u8; 2]>(json!([7, 8])).unwrap(), [7, 8]);
    }

    #[test]
    fn fixed_array_of_pointers() {
        registry::register::<Gear>();
        registry::install(upcaster!(dyn Part => Gear));

        let gears: [Arc<dyn Part>; 2] = [Arc::new(Gear { n: 4 }), Arc::new(Gear { n: 5 })];
        let value = json::to_value(&gears).unwrap();
        assert_eq!(
            value,
            json!([
                { "type": "container.Gear", "n": 4 },
                { "type": "container.Gear", "n": 5 }
            ])
        );

        let mut back: [Arc<dyn Part>; 2] = json::from_value(value.clone()).unwrap();
        assert_eq!(back[0].teeth(), 4);
        assert_eq!(back[1].teeth(), 5);

        let err = json::from_value::<[Arc<dyn Part>; 3]>(value).unwrap_err();
        assert!(matches!(
            err,
            ScribeError::SizeMismatch {
                expected: 3,
                found: 2
            }
        ));

        let mut ar = JsonInputArchive::from_value(json!([{ "type": "container.Gear", "n": 7 }]));
        let err = back.load(&mut ar).unwrap_err();
        assert!(matches!(
            err,
            ScribeError::SizeMismatch {
                expected: 2,
                found: 1
            }
        ));
        assert_eq!(back[0].teeth(), 4);
    }
}
