//! Process-wide descriptor cache keyed by entity type.

use super::{Entity, EntityDescriptor};
use crate::DaoResult;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

static DESCRIPTORS: Lazy<RwLock<HashMap<TypeId, Arc<EntityDescriptor>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Returns the cached descriptor of `E`, validating its schema on first use.
///
/// Invalid declarations are reported as [`DaoError::InvalidEntity`] and are
/// not cached, so every call re-reports them.
///
/// [`DaoError::InvalidEntity`]: crate::DaoError::InvalidEntity
pub fn describe<E: Entity>() -> DaoResult<Arc<EntityDescriptor>> {
    let type_id = TypeId::of::<E>();

    if let Some(descriptor) = DESCRIPTORS.read().get(&type_id) {
        return Ok(Arc::clone(descriptor));
    }

    let descriptor = Arc::new(E::schema().build(&default_name::<E>())?);

    let mut descriptors = DESCRIPTORS.write();
    let cached = descriptors.entry(type_id).or_insert_with(|| {
        debug!(
            entity = descriptor.name(),
            key = descriptor.key_field().name(),
            fields = descriptor.fields().len(),
            "Entity descriptor registered"
        );
        descriptor
    });
    Ok(Arc::clone(cached))
}

/// Lower-cased simple name of the type, without path or generics.
fn default_name<E>() -> String {
    let full = type_name::<E>();
    let without_generics = full.split('<').next().unwrap_or(full);
    without_generics
        .rsplit("::")
        .next()
        .unwrap_or(without_generics)
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FieldType, Json, Value};
    use crate::entity::{Record, Schema};
    use crate::DaoError;

    #[derive(Debug, Clone, PartialEq)]
    struct Player {
        id: i64,
        name: String,
        scores: Vec<u32>,
    }

    impl Entity for Player {
        type Key = i64;

        fn schema() -> Schema {
            Schema::new()
                .key("id", FieldType::Integer)
                .field("name", FieldType::Text)
                .field("scores", FieldType::Structured)
        }

        fn to_record(&self) -> DaoResult<Record> {
            Record::new()
                .with("id", self.id)?
                .with("name", &self.name)?
                .with("scores", Json(&self.scores))
        }

        fn from_record(mut record: Record) -> DaoResult<Self> {
            Ok(Self {
                id: record.take("id")?,
                name: record.take("name")?,
                scores: record.take::<Json<Vec<u32>>>("scores")?.into_inner(),
            })
        }
    }

    struct Keyless;

    impl Entity for Keyless {
        type Key = String;

        fn schema() -> Schema {
            Schema::new().field("value", FieldType::Text)
        }

        fn to_record(&self) -> DaoResult<Record> {
            Ok(Record::new())
        }

        fn from_record(_record: Record) -> DaoResult<Self> {
            Ok(Self)
        }
    }

    #[test]
    fn test_describe_is_cached() {
        let first = describe::<Player>().unwrap();
        let second = describe::<Player>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.name(), "player");
    }

    #[test]
    fn test_concurrent_callers_share_one_descriptor() {
        let barrier = std::sync::Barrier::new(8);
        let descriptors: Vec<Arc<EntityDescriptor>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        barrier.wait();
                        describe::<Player>().unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|handle| handle.join().unwrap()).collect()
        });

        let first = &descriptors[0];
        assert!(descriptors.iter().all(|other| Arc::ptr_eq(first, other)));
        assert!(Arc::ptr_eq(first, &describe::<Player>().unwrap()));
    }

    #[test]
    fn test_invalid_entity_is_reported_every_time() {
        for _ in 0..2 {
            let err = describe::<Keyless>().unwrap_err();
            assert!(matches!(err, DaoError::InvalidEntity { ref entity, .. } if entity == "keyless"));
        }
    }

    #[test]
    fn test_project_then_hydrate_round_trip() {
        let player = Player {
            id: 7,
            name: "Ann".to_string(),
            scores: vec![3, 1, 4],
        };
        let descriptor = describe::<Player>().unwrap();

        let values = descriptor.project(&player.to_record().unwrap()).unwrap();
        assert_eq!(values[0], Value::Int(7));

        let back: Player = descriptor.hydrate(values).unwrap();
        assert_eq!(back, player);
    }

    #[test]
    fn test_hydrate_rejects_wrong_arity() {
        let descriptor = describe::<Player>().unwrap();
        let err = descriptor.hydrate::<Player>(vec![Value::Int(1)]).unwrap_err();
        assert!(err.to_string().contains("expected 3 stored values, found 1"));
    }

    #[test]
    fn test_default_name_strips_path_and_generics() {
        assert_eq!(default_name::<Player>(), "player");
        assert_eq!(default_name::<Vec<Player>>(), "vec");
    }
}
