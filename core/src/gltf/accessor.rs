//! Accessor validation and strided element access.
//!
//! Every accessor goes through [`validate`] before its bytes are touched.
//! Validation checks the accessor range against its buffer view and the
//! view against the declared buffer size, so reads through the resulting
//! [`AccessorLayout`] can slice without further bounds checks.

use crate::mesh::ComponentType;

use super::error::GltfImportError;

/// A validated accessor: where its elements live inside the backing
/// buffer and how they are typed. Holds no buffer borrow, so several
/// layouts can be resolved before any payload is fetched.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AccessorLayout {
    /// Index of the backing buffer.
    pub buffer: usize,
    /// Absolute byte offset of the first element inside the buffer.
    pub begin: usize,
    /// Absolute byte offset one past the last element.
    pub end: usize,
    /// Distance between consecutive elements in bytes.
    pub stride: usize,
    /// Size of one element in bytes.
    pub elem_size: usize,
    /// Element count.
    pub count: usize,
    /// Component type of each element.
    pub component: ComponentType,
    /// Components per element, 1 for scalars up to 16 for 4x4 matrices.
    pub component_count: u32,
    /// Whether integer components store normalized values.
    pub normalized: bool,
    /// Element shape as declared by the document.
    pub dimensions: gltf_dep::accessor::Dimensions,
}

pub(crate) fn map_component(data_type: gltf_dep::accessor::DataType) -> ComponentType {
    use gltf_dep::accessor::DataType;
    match data_type {
        DataType::I8 => ComponentType::I8,
        DataType::U8 => ComponentType::U8,
        DataType::I16 => ComponentType::I16,
        DataType::U16 => ComponentType::U16,
        DataType::U32 => ComponentType::U32,
        DataType::F32 => ComponentType::F32,
    }
}

/// Validate `accessor` and resolve its byte layout.
pub(crate) fn validate(
    accessor: &gltf_dep::Accessor<'_>,
) -> Result<AccessorLayout, GltfImportError> {
    let index = accessor.index();
    let error = |reason: String| GltfImportError::Accessor { index, reason };

    if accessor.sparse().is_some() {
        return Err(error("sparse accessors are not supported".to_string()));
    }
    let view = accessor
        .view()
        .ok_or_else(|| error("accessor has no backing buffer view".to_string()))?;

    let component = map_component(accessor.data_type());
    let dimensions = accessor.dimensions();
    let component_count = dimensions.multiplicity() as u32;
    let elem_size = component.size() * component_count as usize;
    let stride = view.stride().unwrap_or(elem_size);
    if stride < elem_size {
        return Err(error(format!(
            "stride {} is smaller than the element size {}",
            stride, elem_size
        )));
    }

    let count = accessor.count();
    if count == 0 {
        return Err(error("accessor has no elements".to_string()));
    }
    let begin = view.offset() + accessor.offset();
    let end = begin + stride * (count - 1) + elem_size;
    let view_end = view.offset() + view.length();
    if end > view_end {
        return Err(error(format!(
            "range [{}, {}) is out of bounds of buffer view {} ending at {}",
            begin,
            end,
            view.index(),
            view_end
        )));
    }
    if view_end > view.buffer().length() {
        return Err(error(format!(
            "buffer view {} ends at {}, beyond the declared buffer size {}",
            view.index(),
            view_end,
            view.buffer().length()
        )));
    }

    Ok(AccessorLayout {
        buffer: view.buffer().index(),
        begin,
        end,
        stride,
        elem_size,
        count,
        component,
        component_count,
        normalized: accessor.normalized(),
        dimensions,
    })
}

/// Strided element reader over a resolved buffer payload.
pub(crate) struct StridedView<'a> {
    data: &'a [u8],
    stride: usize,
    elem_size: usize,
    count: usize,
}

impl<'a> StridedView<'a> {
    /// View `layout`'s elements inside `buffer`. The layout was bounds
    /// checked against the declared buffer size at validation.
    pub(crate) fn new(layout: &AccessorLayout, buffer: &'a [u8]) -> Self {
        Self {
            data: &buffer[layout.begin..layout.end],
            stride: layout.stride,
            elem_size: layout.elem_size,
            count: layout.count,
        }
    }

    pub(crate) fn count(&self) -> usize {
        self.count
    }

    /// Bytes of one element.
    pub(crate) fn element(&self, index: usize) -> &'a [u8] {
        let begin = index * self.stride;
        &self.data[begin..begin + self.elem_size]
    }

    /// Read one element as little-endian f32 components into `out`.
    pub(crate) fn read_f32(&self, index: usize, out: &mut [f32]) {
        let bytes = self.element(index);
        for (i, value) in out.iter_mut().enumerate() {
            let o = i * 4;
            *value = f32::from_le_bytes([bytes[o], bytes[o + 1], bytes[o + 2], bytes[o + 3]]);
        }
    }

    /// Iterate over all elements.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        (0..self.count).map(move |i| self.element(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(json: &str) -> gltf_dep::Gltf {
        gltf_dep::Gltf::from_slice(json.as_bytes()).unwrap()
    }

    // 12 bytes of payload: f32 1.0, 2.0, 3.0.
    const THREE_FLOATS: &str = "AACAPwAAAEAAAEBA";

    fn scalar_doc(count: usize, byte_offset: usize) -> String {
        format!(
            r#"{{"asset":{{"version":"2.0"}},
            "buffers":[{{"byteLength":12,"uri":"data:application/octet-stream;base64,{THREE_FLOATS}"}}],
            "bufferViews":[{{"buffer":0,"byteOffset":0,"byteLength":12}}],
            "accessors":[{{"bufferView":0,"byteOffset":{byte_offset},"componentType":5126,"count":{count},"type":"SCALAR"}}]}}"#
        )
    }

    #[test]
    fn layout_of_tight_scalars() {
        let gltf = document(&scalar_doc(3, 0));
        let accessor = gltf.document.accessors().next().unwrap();
        let layout = validate(&accessor).unwrap();
        assert_eq!(layout.buffer, 0);
        assert_eq!(layout.begin, 0);
        assert_eq!(layout.end, 12);
        assert_eq!(layout.stride, 4);
        assert_eq!(layout.component, ComponentType::F32);
        assert_eq!(layout.component_count, 1);

        let payload = [
            1.0f32.to_le_bytes(),
            2.0f32.to_le_bytes(),
            3.0f32.to_le_bytes(),
        ]
        .concat();
        let view = StridedView::new(&layout, &payload);
        let mut value = [0.0f32];
        view.read_f32(1, &mut value);
        assert_eq!(value[0], 2.0);
    }

    #[test]
    fn rejects_range_past_view_end() {
        let gltf = document(&scalar_doc(3, 4));
        let accessor = gltf.document.accessors().next().unwrap();
        let error = validate(&accessor).unwrap_err();
        assert!(matches!(
            error,
            GltfImportError::Accessor { index: 0, .. }
        ));
    }
}
