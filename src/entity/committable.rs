use super::Entity;

/// Anything that can hand a repository the entities it should write.
pub trait Committable {
    fn entities_mut(&mut self) -> Vec<&mut Entity>;
}

impl Committable for Entity {
    fn entities_mut(&mut self) -> Vec<&mut Entity> {
        vec![self]
    }
}

impl<'a> Committable for [&'a mut Entity] {
    fn entities_mut(&mut self) -> Vec<&mut Entity> {
        self.iter_mut().map(|e| &mut **e).collect()
    }
}

impl<'a, const N: usize> Committable for [&'a mut Entity; N] {
    fn entities_mut(&mut self) -> Vec<&mut Entity> {
        self.as_mut_slice().entities_mut()
    }
}

impl<'a> Committable for Vec<&'a mut Entity> {
    fn entities_mut(&mut self) -> Vec<&mut Entity> {
        self.as_mut_slice().entities_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_entity_yields_itself() {
        let mut entity = Entity::with_id("match:m1");
        let entities = entity.entities_mut();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].id(), "match:m1");
    }

    #[test]
    fn batch_keeps_order() {
        let mut set = Entity::with_id("set:m1:1");
        let mut perf = Entity::with_id("perf:m1:1:p7");
        let mut batch = vec![&mut set, &mut perf];
        let ids: Vec<String> = batch
            .entities_mut()
            .iter()
            .map(|e| e.id().to_string())
            .collect();
        assert_eq!(ids, vec!["set:m1:1", "perf:m1:1:p7"]);
    }
}
