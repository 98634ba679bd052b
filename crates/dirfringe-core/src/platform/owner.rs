/// File owner lookup.
///
/// On Unix the owner's uid is mapped to a user name through a cached passwd
/// lookup. On Windows the owner SID is read from the file's security
/// descriptor and mapped to an account name. Lookups never fail: anything
/// that goes wrong yields [`UNKNOWN_OWNER`].
use crate::model::RawEntry;

/// Sentinel recorded when the owner cannot be determined.
pub const UNKNOWN_OWNER: &str = "unknown";

/// Maps a discovered entry to the name of its owning account.
pub trait OwnerResolver {
    /// Never fails; returns [`UNKNOWN_OWNER`] on any internal error.
    fn resolve_owner(&self, entry: &RawEntry) -> String;
}

impl<F> OwnerResolver for F
where
    F: Fn(&RawEntry) -> String,
{
    fn resolve_owner(&self, entry: &RawEntry) -> String {
        self(entry)
    }
}

/// Owner lookup against the operating system's account database.
pub struct SystemOwnerResolver {
    #[cfg(unix)]
    cache: uzers::UsersCache,
}

impl SystemOwnerResolver {
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            cache: uzers::UsersCache::new(),
        }
    }
}

impl Default for SystemOwnerResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl OwnerResolver for SystemOwnerResolver {
    fn resolve_owner(&self, entry: &RawEntry) -> String {
        use std::os::unix::fs::MetadataExt;
        use uzers::Users;

        self.cache
            .get_user_by_uid(entry.metadata.uid())
            .map(|user| user.name().to_string_lossy().into_owned())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| UNKNOWN_OWNER.to_string())
    }
}

#[cfg(windows)]
impl OwnerResolver for SystemOwnerResolver {
    fn resolve_owner(&self, entry: &RawEntry) -> String {
        windows_owner(&entry.path).unwrap_or_else(|| UNKNOWN_OWNER.to_string())
    }
}

#[cfg(not(any(unix, windows)))]
impl OwnerResolver for SystemOwnerResolver {
    fn resolve_owner(&self, _entry: &RawEntry) -> String {
        UNKNOWN_OWNER.to_string()
    }
}

/// Read the owner SID of `path` and look up its account name.
#[cfg(windows)]
fn windows_owner(path: &std::path::Path) -> Option<String> {
    use std::os::windows::ffi::OsStrExt;
    use windows::core::{PCWSTR, PWSTR};
    use windows::Win32::Foundation::{LocalFree, ERROR_SUCCESS, HLOCAL};
    use windows::Win32::Security::Authorization::{GetNamedSecurityInfoW, SE_FILE_OBJECT};
    use windows::Win32::Security::{
        LookupAccountSidW, OWNER_SECURITY_INFORMATION, PSECURITY_DESCRIPTOR, PSID, SID_NAME_USE,
    };

    let wide: Vec<u16> = path
        .as_os_str()
        .encode_wide()
        .chain(std::iter::once(0))
        .collect();

    let mut owner = PSID::default();
    let mut descriptor = PSECURITY_DESCRIPTOR::default();

    unsafe {
        let status = GetNamedSecurityInfoW(
            PCWSTR(wide.as_ptr()),
            SE_FILE_OBJECT,
            OWNER_SECURITY_INFORMATION,
            Some(&mut owner as *mut PSID),
            None,
            None,
            None,
            &mut descriptor,
        );
        if status != ERROR_SUCCESS {
            return None;
        }

        let mut name = [0u16; 256];
        let mut domain = [0u16; 256];
        let mut name_len = name.len() as u32;
        let mut domain_len = domain.len() as u32;
        let mut sid_use = SID_NAME_USE::default();

        // `owner` points into `descriptor`, so look it up before freeing.
        let found = LookupAccountSidW(
            PCWSTR::null(),
            owner,
            PWSTR(name.as_mut_ptr()),
            &mut name_len,
            PWSTR(domain.as_mut_ptr()),
            &mut domain_len,
            &mut sid_use,
        );
        let _ = LocalFree(HLOCAL(descriptor.0));

        found.ok()?;
        Some(String::from_utf16_lossy(&name[..name_len as usize]))
    }
}
