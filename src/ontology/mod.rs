// src/ontology/mod.rs
// Skills ontology: a finite set of canonical skills with aliases, loaded
// once from a static data file, and a directed weighted graph of
// related-skill edges used for confidence-decayed BFS expansion.
//
// Grounded on the teacher's process-wide immutable data idiom (`config::CONFIG`
// via `lazy_static!`) — here realized with `once_cell::sync::Lazy` since the
// value is derived from parsing embedded JSON rather than reading env vars.

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet, VecDeque};

const ONTOLOGY_JSON: &str = include_str!("../../data/skills_ontology.json");

#[derive(Debug, Deserialize)]
struct RawSkill {
    id: String,
    aliases: Vec<String>,
    category: String,
}

#[derive(Debug, Deserialize)]
struct RawEdge {
    from: String,
    to: String,
    confidence: f32,
}

#[derive(Debug, Deserialize)]
struct RawOntology {
    skills: Vec<RawSkill>,
    edges: Vec<RawEdge>,
}

#[derive(Debug, Clone)]
pub struct Skill {
    pub id: String,
    pub aliases: Vec<String>,
    pub category: String,
}

/// One hop of a BFS expansion result.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpandedSkill {
    pub skill_name: String,
    pub confidence: f32,
    pub hops: u32,
}

pub struct SkillsOntology {
    skills: HashMap<String, Skill>,
    /// alias (lowercased) -> canonical skill id
    alias_index: HashMap<String, String>,
    /// adjacency list: skill id -> (neighbor id, edge confidence)
    edges: HashMap<String, Vec<(String, f32)>>,
    expand_cache: Mutex<ExpandCache>,
}

struct ExpandCacheEntry {
    key: (String, usize),
    value: Vec<ExpandedSkill>,
    inserted_at: std::time::Instant,
}

/// Bounded LRU with TTL for `(skill, depth)` expansions, capacity 500 / 1h TTL.
struct ExpandCache {
    entries: VecDeque<ExpandCacheEntry>,
}

const EXPAND_CACHE_CAPACITY: usize = 500;
const EXPAND_CACHE_TTL: std::time::Duration = std::time::Duration::from_secs(3600);

impl ExpandCache {
    fn new() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }

    fn get(&mut self, key: &(String, usize)) -> Option<Vec<ExpandedSkill>> {
        self.evict_expired();
        if let Some(pos) = self.entries.iter().position(|e| &e.key == key) {
            let entry = self.entries.remove(pos).unwrap();
            let value = entry.value.clone();
            self.entries.push_back(entry);
            Some(value)
        } else {
            None
        }
    }

    fn put(&mut self, key: (String, usize), value: Vec<ExpandedSkill>) {
        self.evict_expired();
        self.entries.retain(|e| e.key != key);
        if self.entries.len() >= EXPAND_CACHE_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(ExpandCacheEntry {
            key,
            value,
            inserted_at: std::time::Instant::now(),
        });
    }

    fn evict_expired(&mut self) {
        let now = std::time::Instant::now();
        self.entries
            .retain(|e| now.duration_since(e.inserted_at) < EXPAND_CACHE_TTL);
    }
}

pub static ONTOLOGY: Lazy<SkillsOntology> = Lazy::new(SkillsOntology::load);

impl SkillsOntology {
    fn load() -> Self {
        let raw: RawOntology =
            serde_json::from_str(ONTOLOGY_JSON).expect("embedded skills ontology is valid JSON");

        let mut skills = HashMap::new();
        let mut alias_index = HashMap::new();

        for s in raw.skills {
            alias_index.insert(s.id.to_lowercase(), s.id.clone());
            for alias in &s.aliases {
                alias_index.insert(alias.to_lowercase(), s.id.clone());
            }
            skills.insert(
                s.id.clone(),
                Skill {
                    id: s.id,
                    aliases: s.aliases,
                    category: s.category,
                },
            );
        }

        let mut edges: HashMap<String, Vec<(String, f32)>> = HashMap::new();
        for e in raw.edges {
            edges.entry(e.from).or_default().push((e.to, e.confidence));
        }

        Self {
            skills,
            alias_index,
            edges,
            expand_cache: Mutex::new(ExpandCache::new()),
        }
    }

    /// Resolve a free-text name or alias to its canonical skill, case-insensitive.
    pub fn resolve_skill(&self, name_or_alias: &str) -> Option<&Skill> {
        let key = name_or_alias.trim().to_lowercase();
        self.alias_index.get(&key).and_then(|id| self.skills.get(id))
    }

    /// BFS expansion of related skills up to `depth` hops. Confidence along a
    /// path is the product of edge confidences; when a skill is reachable by
    /// multiple paths, the maximum confidence observed is kept. Results below
    /// `min_confidence` are dropped. Cached per `(skill, depth)`.
    pub fn expand(&self, skill: &str, depth: usize, min_confidence: f32) -> Vec<ExpandedSkill> {
        let canonical = match self.resolve_skill(skill) {
            Some(s) => s.id.clone(),
            None => return Vec::new(),
        };

        let cache_key = (canonical.clone(), depth);
        if let Some(cached) = self.expand_cache.lock().get(&cache_key) {
            return cached
                .into_iter()
                .filter(|e| e.confidence >= min_confidence)
                .collect();
        }

        let mut best: HashMap<String, ExpandedSkill> = HashMap::new();
        let mut queue: VecDeque<(String, f32, u32)> = VecDeque::new();
        let mut visited_at_hop: HashSet<(String, u32)> = HashSet::new();
        queue.push_back((canonical.clone(), 1.0, 0));

        while let Some((current, path_confidence, hops)) = queue.pop_front() {
            if hops >= depth as u32 {
                continue;
            }
            let Some(neighbors) = self.edges.get(&current) else {
                continue;
            };
            for (neighbor, edge_confidence) in neighbors {
                if neighbor == &canonical {
                    continue;
                }
                let next_confidence = path_confidence * edge_confidence;
                let next_hops = hops + 1;

                let improved = match best.get(neighbor) {
                    Some(existing) => next_confidence > existing.confidence,
                    None => true,
                };
                if improved {
                    best.insert(
                        neighbor.clone(),
                        ExpandedSkill {
                            skill_name: neighbor.clone(),
                            confidence: next_confidence,
                            hops: next_hops,
                        },
                    );
                }

                if visited_at_hop.insert((neighbor.clone(), next_hops)) {
                    queue.push_back((neighbor.clone(), next_confidence, next_hops));
                }
            }
        }

        let mut all: Vec<ExpandedSkill> = best.into_values().collect();
        all.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap());

        self.expand_cache.lock().put(cache_key, all.clone());

        all.into_iter()
            .filter(|e| e.confidence >= min_confidence)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_and_alias_case_insensitively() {
        assert!(ONTOLOGY.resolve_skill("Python").is_some());
        assert!(ONTOLOGY.resolve_skill("PY").is_some());
        assert!(ONTOLOGY.resolve_skill("nonexistent-skill").is_none());
    }

    #[test]
    fn python_expands_to_web_frameworks_with_bounded_confidence() {
        let expanded = ONTOLOGY.expand("python", 1, 0.8);
        let names: HashSet<_> = expanded.iter().map(|e| e.skill_name.as_str()).collect();
        assert!(names.contains("django"));
        assert!(names.contains("flask"));
        assert!(names.contains("fastapi"));
        for e in &expanded {
            assert!(e.confidence > 0.8);
            assert!(e.confidence < 1.0);
        }
    }

    #[test]
    fn unknown_skill_expands_to_empty() {
        assert!(ONTOLOGY.expand("not-a-real-skill", 1, 0.5).is_empty());
    }

    #[test]
    fn depth_limits_bfs_traversal() {
        // docker -> kubernetes -> terraform is 2 hops; depth=1 should not reach terraform.
        let shallow = ONTOLOGY.expand("docker", 1, 0.0);
        assert!(!shallow.iter().any(|e| e.skill_name == "terraform"));

        let deep = ONTOLOGY.expand("docker", 2, 0.0);
        assert!(deep.iter().any(|e| e.skill_name == "terraform"));
    }
}
