/// 階層ストアのパッケージキー名。
///
/// `<Identity>_<Version...>_<Architecture>_<PublisherId>` 形式。
/// タイトル識別子は最初の `_` より前、パブリッシャIDは最後の `_` より後。
/// ストアのレイアウトバージョンをまたいで一意とは限らない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageKey {
    raw: String,
    app_id: String,
    publisher_id: String,
}

impl PackageKey {
    /// キー名を分解する。`_` を含まない名前はパッケージキーではない。
    pub fn parse(raw: &str) -> Option<Self> {
        let first = raw.find('_')?;
        let last = raw.rfind('_')?;
        let app_id = &raw[..first];
        let publisher_id = &raw[last + 1..];
        if app_id.is_empty() || publisher_id.is_empty() {
            return None;
        }
        Some(Self {
            raw: raw.to_string(),
            app_id: app_id.to_string(),
            publisher_id: publisher_id.to_string(),
        })
    }

    /// ストア上のキー名そのもの。
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    pub fn publisher_id(&self) -> &str {
        &self.publisher_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_identity_and_publisher() {
        let key = PackageKey::parse("Publisher.Foo_1.2.3.0_x64__8wekyb3d8bbwe").unwrap();
        assert_eq!(key.app_id(), "Publisher.Foo");
        assert_eq!(key.publisher_id(), "8wekyb3d8bbwe");
        assert_eq!(key.raw(), "Publisher.Foo_1.2.3.0_x64__8wekyb3d8bbwe");
    }

    #[test]
    fn parse_rejects_names_without_separator() {
        assert!(PackageKey::parse("NotAPackage").is_none());
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(PackageKey::parse("_1.0_x64_pub").is_none());
        assert!(PackageKey::parse("Foo_1.0_x64_").is_none());
    }

    #[test]
    fn single_separator_yields_same_boundaries() {
        // 最初と最後の `_` が同一でも分解は成立する
        let key = PackageKey::parse("Foo_pub").unwrap();
        assert_eq!(key.app_id(), "Foo");
        assert_eq!(key.publisher_id(), "pub");
    }
}
