//! Lookup tables built once over a parsed COCO document.
//!
//! Three independent passes feed the rest of the pipeline:
//! - [`CategoryIndex`]: category id -> name and class index
//! - [`ImageRegistry`]: image id -> image metadata
//! - [`AnnotationGroups`]: image id -> annotations, in source order
//!
//! [`CocoIndex::build`] runs all three and checks that every annotation
//! points at a known image and category. Any inconsistency is a
//! [`SchemaError`], raised before a single output file is written.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::error::SchemaError;
use crate::ir::{Annotation, Category, CategoryId, Dataset, Image, ImageId};

/// Category lookup preserving the order of the source list.
#[derive(Clone, Debug)]
pub struct CategoryIndex {
    categories: Vec<Category>,
    class_by_id: HashMap<CategoryId, usize>,
}

impl CategoryIndex {
    /// Indexes categories by position. Empty lists and repeated ids are rejected.
    pub fn build(categories: Vec<Category>) -> Result<Self, SchemaError> {
        if categories.is_empty() {
            return Err(SchemaError::EmptyCategories);
        }

        let mut class_by_id = HashMap::with_capacity(categories.len());
        for (class_index, category) in categories.iter().enumerate() {
            match class_by_id.entry(category.id) {
                Entry::Occupied(_) => return Err(SchemaError::DuplicateCategoryId(category.id)),
                Entry::Vacant(slot) => {
                    slot.insert(class_index);
                }
            }
        }

        Ok(Self {
            categories,
            class_by_id,
        })
    }

    pub fn class_index(&self, id: CategoryId) -> Option<usize> {
        self.class_by_id.get(&id).copied()
    }

    pub fn name(&self, id: CategoryId) -> Option<&str> {
        self.class_index(id)
            .map(|index| self.categories[index].name.as_str())
    }

    /// Names in class-index order, as written to the manifest.
    pub fn names(&self) -> Vec<String> {
        self.categories.iter().map(|c| c.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Image metadata by id.
#[derive(Clone, Debug, Default)]
pub struct ImageRegistry {
    images: HashMap<ImageId, Image>,
}

impl ImageRegistry {
    pub fn build(images: Vec<Image>) -> Result<Self, SchemaError> {
        let mut by_id = HashMap::with_capacity(images.len());
        for image in images {
            match by_id.entry(image.id) {
                Entry::Occupied(_) => return Err(SchemaError::DuplicateImageId(image.id)),
                Entry::Vacant(slot) => {
                    slot.insert(image);
                }
            }
        }
        Ok(Self { images: by_id })
    }

    pub fn get(&self, id: ImageId) -> Option<&Image> {
        self.images.get(&id)
    }

    pub fn contains(&self, id: ImageId) -> bool {
        self.images.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Annotations grouped per image.
///
/// Groups keep the order annotations appear in the source. The list of
/// annotated image ids keeps the order in which each image was first
/// referenced; that order is the input to the split partitioner.
#[derive(Clone, Debug, Default)]
pub struct AnnotationGroups {
    by_image: HashMap<ImageId, Vec<Annotation>>,
    image_order: Vec<ImageId>,
}

impl AnnotationGroups {
    pub fn group(annotations: Vec<Annotation>) -> Self {
        let mut groups = Self::default();
        for annotation in annotations {
            groups.push(annotation);
        }
        groups
    }

    fn push(&mut self, annotation: Annotation) {
        match self.by_image.entry(annotation.image_id) {
            Entry::Occupied(mut slot) => slot.get_mut().push(annotation),
            Entry::Vacant(slot) => {
                self.image_order.push(annotation.image_id);
                slot.insert(vec![annotation]);
            }
        }
    }

    /// Annotations of one image; empty for images with none.
    pub fn for_image(&self, id: ImageId) -> &[Annotation] {
        self.by_image.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids of images holding at least one annotation, first-reference order.
    pub fn annotated_image_ids(&self) -> &[ImageId] {
        &self.image_order
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.image_order
            .iter()
            .flat_map(move |id| self.for_image(*id).iter())
    }

    pub fn annotation_count(&self) -> usize {
        self.by_image.values().map(Vec::len).sum()
    }
}

/// All lookup tables for one conversion run.
#[derive(Clone, Debug)]
pub struct CocoIndex {
    pub categories: CategoryIndex,
    pub images: ImageRegistry,
    pub annotations: AnnotationGroups,
}

impl CocoIndex {
    /// Builds every table and verifies annotation references.
    pub fn build(dataset: Dataset) -> Result<Self, SchemaError> {
        let categories = CategoryIndex::build(dataset.categories)?;
        let images = ImageRegistry::build(dataset.images)?;

        for annotation in &dataset.annotations {
            if !images.contains(annotation.image_id) {
                return Err(SchemaError::UnknownImage {
                    annotation: annotation.id,
                    image: annotation.image_id,
                });
            }
            if categories.class_index(annotation.category_id).is_none() {
                return Err(SchemaError::UnknownCategory {
                    annotation: annotation.id,
                    category: annotation.category_id,
                });
            }
        }

        let annotations = AnnotationGroups::group(dataset.annotations);
        log::debug!(
            "indexed {} categories, {} images, {} annotations over {} annotated images",
            categories.len(),
            images.len(),
            annotations.annotation_count(),
            annotations.annotated_image_ids().len()
        );

        Ok(Self {
            categories,
            images,
            annotations,
        })
    }

    /// Class index of a validated annotation's category.
    pub fn class_index_of(&self, annotation: &Annotation) -> Option<usize> {
        self.categories.class_index(annotation.category_id)
    }
}
