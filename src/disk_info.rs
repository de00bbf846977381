use std::path::Path;

/// Capacity of the volume holding a path.
#[derive(Debug, Clone, Copy)]
pub struct DiskInfo {
    pub total: u64,
    pub available: u64,
}

impl DiskInfo {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }

    pub fn usage_percent(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        self.used() as f32 / self.total as f32
    }
}

#[cfg(unix)]
pub fn get_disk_info(path: &Path) -> Option<DiskInfo> {
    use std::ffi::CString;
    use std::mem::MaybeUninit;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    let mut stat = MaybeUninit::<libc::statvfs>::uninit();
    let ret = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if ret != 0 {
        return None;
    }
    let stat = unsafe { stat.assume_init() };
    let block_size = stat.f_frsize as u64;
    Some(DiskInfo {
        total: stat.f_blocks as u64 * block_size,
        available: stat.f_bavail as u64 * block_size,
    })
}

#[cfg(not(unix))]
pub fn get_disk_info(_path: &Path) -> Option<DiskInfo> {
    None
}
