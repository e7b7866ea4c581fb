use crate::host::{Entity, HostEditor, HostResult, NodeId, SelectionAnchor};

/// Entity type tag reserved for the wrapper placed around a selected image.
pub const ENTITY_TYPE: &str = "IMAGE_RESIZE_WRAPPER";
/// Marker present on the image only while a session is active.
pub const SESSION_ATTRIBUTE: &str = "data-image-grip-session";

const WRAPPED_IMAGE_SELECTOR: &str = "img";

pub fn is_handler_entity(entity: &Entity) -> bool {
    entity.type_tag == ENTITY_TYPE
}

/// Wraps `image` into a read-only inline entity and moves its rotation onto
/// the wrapper so resize math stays axis-aligned.
pub fn wrap_image<H: HostEditor>(
    host: &mut H,
    image: NodeId,
    anchor: SelectionAnchor,
) -> HostResult<NodeId> {
    let entity = host.wrap_entity(image, ENTITY_TYPE, false, true)?;
    let wrapper = entity.wrapper;
    let transform = host.transform(image);
    host.set_transform(wrapper, &transform)?;
    host.set_transform(image, "")?;
    host.select(wrapper, Some(anchor))?;
    tracing::debug!(?image, ?wrapper, "wrapped image");
    Ok(wrapper)
}

/// The wrapper entity directly around `image`, if it is one of ours.
pub fn image_wrapper<H: HostEditor>(host: &H, image: NodeId) -> Option<NodeId> {
    let parent = host.parent(image)?;
    host.entity_of(parent)
        .filter(is_handler_entity)
        .map(|entity| entity.wrapper)
}

/// Unwraps `wrapper`, or every wrapper of ours in the document when `None`.
/// The wrapper's rotation is handed back to the image.
pub fn remove_wrappers<H: HostEditor>(host: &mut H, wrapper: Option<NodeId>) -> HostResult<()> {
    let wrappers = match wrapper {
        Some(wrapper) => vec![wrapper],
        None => host.query_entities(ENTITY_TYPE),
    };

    for wrapper in wrappers {
        let Some(image) = host
            .query_images(Some(wrapper), WRAPPED_IMAGE_SELECTOR)
            .into_iter()
            .next()
        else {
            continue;
        };
        if host.parent(wrapper).is_none() {
            continue;
        }
        let transform = host.transform(wrapper);
        host.set_transform(image, &transform)?;
        host.insert_before(image, wrapper)?;
        host.remove_node(wrapper)?;
        tracing::debug!(?image, ?wrapper, "unwrapped image");
    }
    Ok(())
}
