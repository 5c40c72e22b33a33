//! 临时文件暂存
//!
//! 规则文档与报告文件都只在单个步骤内存活：创建它的步骤独占所有权，
//! 无论成败都要在控制权交还前删除。`SpoolFile` 的 `Drop` 仅作兜底，
//! 正常路径应显式调用 `remove`。

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::warn;

/// 暂存目录
#[derive(Clone, Debug)]
pub struct SpoolDir {
    root: PathBuf,
}

impl SpoolDir {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)
            .with_context(|| format!("create spool dir {:?}", root))?;
        Ok(Self { root })
    }

    /// 写入一个暂存文件，返回其独占句柄
    pub async fn write(&self, file_name: &str, payload: &[u8]) -> Result<SpoolFile> {
        let path = self.root.join(file_name);
        fs::write(&path, payload)
            .await
            .with_context(|| format!("write spool file {:?}", path))?;
        Ok(SpoolFile {
            path,
            removed: false,
        })
    }
}

/// 单个暂存文件的独占句柄
#[derive(Debug)]
pub struct SpoolFile {
    path: PathBuf,
    removed: bool,
}

impl SpoolFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<Vec<u8>> {
        fs::read(&self.path)
            .await
            .with_context(|| format!("read spool file {:?}", self.path))
    }

    pub async fn read_to_string(&self) -> Result<String> {
        fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read spool file {:?}", self.path))
    }

    /// 显式删除；删除失败只记日志，不影响调用方
    pub async fn remove(mut self) {
        self.removed = true;
        if let Err(err) = fs::remove_file(&self.path).await {
            warn!(path = ?self.path, error = %err, "failed to remove spool file");
        }
    }
}

impl Drop for SpoolFile {
    fn drop(&mut self) {
        if !self.removed {
            if let Err(err) = std::fs::remove_file(&self.path) {
                warn!(path = ?self.path, error = %err, "failed to remove spool file on drop");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_read_remove_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let spool = SpoolDir::new(dir.path()).unwrap();

        let file = spool.write("rules.txt", b"a >> b").await.unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(file.read_to_string().await.unwrap(), "a >> b");

        file.remove().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn drop_removes_file_on_error_paths() {
        let dir = tempfile::tempdir().unwrap();
        let spool = SpoolDir::new(dir.path()).unwrap();

        let path = {
            let file = spool.write("report.txt", b"x").await.unwrap();
            file.path().to_path_buf()
            // 句柄在此处离开作用域
        };
        assert!(!path.exists());
    }
}
