//Copyright 2024 Felix Engl
//
//Licensed under the Apache License, Version 2.0 (the "License");
//you may not use this file except in compliance with the License.
//You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
//Unless required by applicable law or agreed to in writing, software
//distributed under the License is distributed on an "AS IS" BASIS,
//WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
//See the License for the specific language governing permissions and
//limitations under the License.

use std::borrow::Borrow;
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{BufRead, Write};
use std::ops::Range;
use std::slice::Iter;
use std::str::FromStr;
use crate::traits::AsParseableString;
use crate::vocabulary::LoadVocabularyError;

/// A basic vocabulary, a dense mapping from ids to words.
pub trait BasicVocabulary<T>: AsRef<[T]> {
    /// The number of entries in the vocabulary
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clear the whole thing
    fn clear(&mut self);

    /// Get the ids
    fn ids(&self) -> Range<usize>;

    /// Iterates over the words in the order of the ids.
    /// To get the ids use .enumerate()
    fn iter(&self) -> Iter<T>;

    /// Get the word for a specific `id` or none
    fn get_value_by_id(&self, id: usize) -> Option<&T>;

    /// Check if the `id` is contained in this
    fn contains_id(&self, id: usize) -> bool;
}

/// Allows to search a vocabulary by a query
pub trait SearchableVocabulary<T>: BasicVocabulary<T> where T: Eq + Hash {

    /// Retrieves the id for `q`
    fn get_id<Q: ?Sized>(&self, q: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq;

    fn contains_value<Q: ?Sized>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq
    {
        self.get_id(value).is_some()
    }
}

/// A vocabulary that can be modified. Ids are never reused or removed.
pub trait VocabularyMut<T>: SearchableVocabulary<T> where T: Eq + Hash + Clone {
    /// Adds the `value` to the vocabulary and returns the associated id
    fn add_value(&mut self, value: T) -> usize;

    /// Adds any `value` that can be converted into `T`
    fn add<V: Into<T>>(&mut self, value: V) -> usize {
        self.add_value(value.into())
    }
}

/// A vocabulary that can be stored in the list format, one word per line
/// where the line number is the id.
pub trait StoreableVocabulary<T> where T: AsParseableString {
    /// Writes the vocabulary to `writer` in the list format
    fn save_to_output(&self, writer: &mut impl Write) -> std::io::Result<usize>;
}

/// A vocabulary that can be loaded from the list format.
pub trait LoadableVocabulary<T, E>: Sized where T: Hash + Eq + FromStr<Err=E>, E: Debug {
    /// Loads from a `reader` in the list format
    fn load_from_input(reader: &mut impl BufRead) -> Result<Self, LoadVocabularyError<E>>;
}
