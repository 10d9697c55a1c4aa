use crate::scheduler::RunOutput;
use anyhow::Context;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

pub trait Storage {
    /// Recharge un run depuis un support.
    fn load(&self) -> anyhow::Result<RunOutput>;
    /// Sauvegarde de manière atomique.
    fn save(&self, output: &RunOutput) -> anyhow::Result<()>;
}

/// Un run par fichier JSON.
pub struct JsonStorage {
    path: PathBuf,
    /// Seed attendu au chargement, pour les fichiers nommés par seed.
    seed: Option<u64>,
}

impl JsonStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        Ok(Self {
            path: path.as_ref().to_path_buf(),
            seed: None,
        })
    }

    /// `run-<seed>.json` dans `dir`, à côté des exports CSV du même seed.
    pub fn for_seed<P: AsRef<Path>>(dir: P, seed: u64) -> Self {
        Self {
            path: dir.as_ref().join(format!("run-{seed}.json")),
            seed: Some(seed),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonStorage {
    fn load(&self) -> anyhow::Result<RunOutput> {
        let data = fs::read(&self.path).with_context(|| format!("reading {}", self.path.display()))?;
        let output: RunOutput = serde_json::from_slice(&data)
            .with_context(|| format!("parsing run output {}", self.path.display()))?;
        if let Some(seed) = self.seed {
            anyhow::ensure!(
                output.seed == seed,
                "{} holds seed {}, expected {seed}",
                self.path.display(),
                output.seed
            );
        }
        Ok(output)
    }

    fn save(&self, output: &RunOutput) -> anyhow::Result<()> {
        if let Some(seed) = self.seed {
            anyhow::ensure!(
                output.seed == seed,
                "run for seed {} cannot go to {}",
                output.seed,
                self.path.display()
            );
        }
        let json = serde_json::to_vec_pretty(output)?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| "creating temp file")?;
        tmp.write_all(&json)?;
        tmp.flush()?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).with_context(|| "atomic rename")?;
        Ok(())
    }
}
