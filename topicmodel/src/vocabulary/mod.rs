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

mod traits;

pub use traits::*;
use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{BufRead, BufWriter, Write};
use std::ops::Range;
use std::slice::Iter;
use std::str::FromStr;
use thiserror::Error;
use crate::traits::AsParseableString;

/// The vocabulary used by the sampler, words are whitespace free strings.
pub type StringVocabulary = Vocabulary<String>;

#[macro_export]
macro_rules! voc {
    () => {
        $crate::vocabulary::Vocabulary::default()
    };
    ($($value: tt),+ $(,)?) => {
        {
            let mut __voc = $crate::vocabulary::Vocabulary::default();
            $(
                $crate::vocabulary::VocabularyMut::add_value(&mut __voc, $value.into());
            )+
            __voc
        }
    };
}

/// A vocabulary mapping between an usize id and a specific object (word).
/// Ids are handed out sequentially starting at 0 in first-seen order.
#[derive(Clone, Debug)]
pub struct Vocabulary<T> {
    id2entry: Vec<T>,
    entry2id: HashMap<T, usize>,
}

impl<T> Vocabulary<T> {
    /// Create a new empty vocabulary.
    pub fn empty() -> Self {
        Self {
            id2entry: Vec::new(),
            entry2id: HashMap::new(),
        }
    }
}

impl<T> Vocabulary<T> where T: Eq + Hash + Clone {
    /// Creates the vocabulary from a list where the position is the id.
    /// Returns the first position that repeats an earlier word.
    pub fn try_from_list(id2entry: Vec<T>) -> Result<Self, usize> {
        let mut entry2id = HashMap::with_capacity(id2entry.len());
        for (id, value) in id2entry.iter().enumerate() {
            if entry2id.insert(value.clone(), id).is_some() {
                return Err(id)
            }
        }
        Ok(Self { id2entry, entry2id })
    }
}

impl<T> BasicVocabulary<T> for Vocabulary<T> {
    /// The number of entries in the vocabulary
    fn len(&self) -> usize {
        self.id2entry.len()
    }

    /// Clear the whole thing
    fn clear(&mut self){
        self.id2entry.clear();
        self.entry2id.clear();
    }

    /// Get the ids
    fn ids(&self) -> Range<usize> {
        0..self.id2entry.len()
    }

    /// Iterate over the words
    fn iter(&self) -> Iter<T> {
        self.id2entry.iter()
    }

    fn get_value_by_id(&self, id: usize) -> Option<&T> {
        self.id2entry.get(id)
    }

    fn contains_id(&self, id: usize) -> bool {
        self.id2entry.len() > id
    }
}

impl<T> Default for Vocabulary<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> AsRef<[T]> for Vocabulary<T> {
    fn as_ref(&self) -> &[T] {
        &self.id2entry
    }
}

impl<T> SearchableVocabulary<T> for Vocabulary<T> where T: Eq + Hash {
    fn get_id<Q: ?Sized>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: Hash + Eq
    {
        self.entry2id.get(value).copied()
    }
}

impl<T> VocabularyMut<T> for Vocabulary<T> where T: Eq + Hash + Clone {
    fn add_value(&mut self, value: T) -> usize {
        match self.entry2id.entry(value) {
            Entry::Occupied(entry) => {
                *entry.get()
            }
            Entry::Vacant(entry) => {
                let pos = self.id2entry.len();
                self.id2entry.push(entry.key().clone());
                entry.insert(pos);
                pos
            }
        }
    }
}

impl<T> PartialEq for Vocabulary<T> where T: Eq {
    fn eq(&self, other: &Self) -> bool {
        self.id2entry == other.id2entry
    }
}

impl<T> Eq for Vocabulary<T> where T: Eq {}

#[derive(Debug, Error)]
pub enum LoadVocabularyError<E: Debug> {
    #[error(transparent)]
    IO(#[from] std::io::Error),
    #[error("Had a parse error in line {line}: {err:?}")]
    Parse {
        line: usize,
        err: E
    },
    #[error("The line {line} does not contain a word!")]
    EmptyEntry {
        line: usize
    },
    #[error("The word in line {line} was already registered!")]
    Duplicate {
        line: usize
    },
}

impl<T, E> LoadableVocabulary<T, E> for Vocabulary<T>
where
    T: Hash + Eq + Clone + FromStr<Err=E>,
    E: Debug
{
    fn load_from_input(reader: &mut impl BufRead) -> Result<Self, LoadVocabularyError<E>> {
        let mut id2entry = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                return Err(LoadVocabularyError::EmptyEntry { line: line_no })
            }
            id2entry.push(line.parse().map_err(|err| LoadVocabularyError::Parse { line: line_no, err })?)
        }
        Self::try_from_list(id2entry).map_err(|line| LoadVocabularyError::Duplicate { line })
    }
}

impl<T> StoreableVocabulary<T> for Vocabulary<T>
where
    T: AsParseableString
{
    /// Writes the vocabulary to `writer` in the list format
    fn save_to_output(&self, writer: &mut impl Write) -> std::io::Result<usize> {
        let mut written = 0;
        let mut writer = BufWriter::new(writer);
        for value in self.id2entry.iter() {
            let value = value.as_parseable_string();
            writer.write_all(value.as_bytes())?;
            writer.write_all(b"\n")?;
            written += value.len() + 1;
        }
        writer.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod test {
    use std::io::BufReader;
    use crate::vocabulary::{BasicVocabulary, LoadVocabularyError, LoadableVocabulary, SearchableVocabulary, StoreableVocabulary, StringVocabulary, VocabularyMut};

    #[test]
    fn ids_are_sequential_in_first_seen_order(){
        let mut voc = StringVocabulary::default();
        assert_eq!(0, voc.add("a"));
        assert_eq!(1, voc.add("b"));
        assert_eq!(0, voc.add("a"));
        assert_eq!(2, voc.add("c"));
        assert_eq!(3, voc.len());
        for id in voc.ids() {
            let word = voc.get_value_by_id(id).unwrap();
            assert_eq!(Some(id), voc.get_id(word.as_str()));
        }
    }

    #[test]
    fn list_format_is_symmetric(){
        let voc: StringVocabulary = crate::voc!["plane", "wing", "deck"];
        let mut buf = Vec::new();
        voc.save_to_output(&mut buf).unwrap();
        assert_eq!("plane\nwing\ndeck\n", String::from_utf8(buf.clone()).unwrap());
        let loaded = StringVocabulary::load_from_input(&mut BufReader::new(buf.as_slice())).unwrap();
        assert_eq!(voc, loaded);
        assert_eq!(Some(1), loaded.get_id("wing"));
    }

    #[test]
    fn duplicates_are_rejected(){
        let err = StringVocabulary::load_from_input(&mut BufReader::new("a\nb\na\n".as_bytes())).unwrap_err();
        assert!(matches!(err, LoadVocabularyError::Duplicate { line: 2 }));
    }

    #[test]
    fn empty_lines_are_rejected(){
        let err = StringVocabulary::load_from_input(&mut BufReader::new("a\n\nb\n".as_bytes())).unwrap_err();
        assert!(matches!(err, LoadVocabularyError::EmptyEntry { line: 1 }));
    }
}
